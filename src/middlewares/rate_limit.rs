/*!
 * 速率限制中间件
 *
 * 固定窗口计数：同一标识（已登录教师 ID，否则客户端 IP）在一个窗口内
 * 超过上限即返回 429。
 *
 * ```rust,ignore
 * web::scope("/api/v1/auth")
 *     .service(web::resource("/login").route(web::post().to(login).wrap(RateLimit::login())))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::CONTENT_TYPE,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::net::IpAddr;
use std::rc::Rc;
use std::time::Duration;
use tracing::warn;

use crate::models::instructors::entities::Instructor;
use crate::models::{ApiResponse, ErrorCode};

// 窗口最长一小时，计数键里带窗口序号，过期只用于回收内存
static RATE_LIMIT_COUNTERS: Lazy<Cache<String, u32>> = Lazy::new(|| {
    Cache::builder()
        .time_to_live(Duration::from_secs(3600))
        .max_capacity(100_000)
        .build()
});

#[derive(Clone)]
pub struct RateLimit {
    max_requests: u32,
    window_secs: u64,
    key_prefix: String,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs: window_secs.clamp(1, 3600),
            key_prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.key_prefix = prefix.to_string();
        self
    }

    /// 登录：5 次/分钟
    pub fn login() -> Self {
        Self::new(5, 60).with_prefix("login")
    }

    /// 刷新令牌：10 次/分钟
    pub fn refresh_token() -> Self {
        Self::new(10, 60).with_prefix("refresh")
    }

    /// 公开学生档案查询：30 次/分钟，防止枚举学号
    pub fn public_profile() -> Self {
        Self::new(30, 60).with_prefix("public_profile")
    }

    fn counter_key(&self, identifier: &str, now_secs: u64) -> String {
        let window = now_secs / self.window_secs;
        format!("{}:{}:{}", self.key_prefix, identifier, window)
    }

    /// 距离当前窗口结束的秒数
    fn retry_after(&self, now_secs: u64) -> u64 {
        self.window_secs - now_secs % self.window_secs
    }
}

fn is_valid_ip(ip: &str) -> bool {
    ip.parse::<IpAddr>().is_ok()
}

/// 客户端 IP：优先取连接信息，其次取反向代理头
fn extract_client_ip(req: &ServiceRequest) -> String {
    let connection_ip = req
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string());

    if let Some(ip) = connection_ip.as_deref().filter(|ip| is_valid_ip(ip)) {
        return ip.to_string();
    }

    for header in ["X-Forwarded-For", "X-Real-IP"] {
        if let Some(ip) = req
            .headers()
            .get(header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| is_valid_ip(ip))
        {
            return ip.to_string();
        }
    }

    connection_ip.unwrap_or_else(|| "unknown".to_string())
}

fn request_identifier(req: &ServiceRequest) -> String {
    let instructor_id = req.extensions().get::<Instructor>().map(|i| i.id);
    match instructor_id {
        Some(id) => format!("instructor:{id}"),
        None => format!("ip:{}", extract_client_ip(req)),
    }
}

fn too_many_requests(retry_after: u64) -> HttpResponse {
    HttpResponse::build(StatusCode::TOO_MANY_REQUESTS)
        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
        .insert_header(("Retry-After", retry_after.to_string()))
        .json(ApiResponse::<()>::error_empty(
            ErrorCode::RateLimitExceeded,
            "Too many requests, please try again later",
        ))
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddleware {
            service: Rc::new(service),
            policy: Rc::new(self.clone()),
        }))
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
    policy: Rc<RateLimit>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let policy = self.policy.clone();

        Box::pin(async move {
            let now = chrono::Utc::now().timestamp().max(0) as u64;
            let key = policy.counter_key(&request_identifier(&req), now);

            let count = RATE_LIMIT_COUNTERS
                .entry(key.clone())
                .and_upsert_with(|entry| {
                    let current = entry.map(|e| e.into_value()).unwrap_or(0);
                    std::future::ready(current.saturating_add(1))
                })
                .await
                .into_value();

            if count > policy.max_requests {
                warn!(
                    "Rate limit exceeded for {} ({}/{})",
                    key, count, policy.max_requests
                );
                return Ok(req.into_response(
                    too_many_requests(policy.retry_after(now)).map_into_right_body(),
                ));
            }

            Ok(srv.call(req).await?.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let login = RateLimit::login();
        assert_eq!((login.max_requests, login.window_secs), (5, 60));
        assert_eq!(RateLimit::public_profile().key_prefix, "public_profile");
    }

    #[test]
    fn test_window_keys() {
        let limit = RateLimit::new(5, 60).with_prefix("login");
        assert_eq!(limit.counter_key("ip:1.2.3.4", 119), "login:ip:1.2.3.4:1");
        assert_eq!(limit.counter_key("ip:1.2.3.4", 120), "login:ip:1.2.3.4:2");
        assert_eq!(limit.retry_after(119), 1);
        assert_eq!(limit.retry_after(120), 60);
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(RateLimit::new(1, 0).window_secs, 1);
        assert_eq!(RateLimit::new(1, 86_400).window_secs, 3600);
    }
}
