/*!
 * JWT 认证中间件
 *
 * 客户端在请求头中携带 `Authorization: Bearer <access_token>`。
 * 校验通过后，当前教师写入请求扩展，处理函数通过
 * `RequireJWT::current_instructor(&req)` 读取。
 *
 * 教师信息按 token 缓存在 `ObjectCache` 中，缓存未命中时回源数据库，
 * 被停用的账号即使持有有效 token 也会被拒绝。
 *
 * ```rust,ignore
 * web::scope("/api/v1/courses")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(list_courses))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::{StatusCode, header::HeaderMap},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;
use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::ErrorCode;
use crate::models::instructors::entities::{Instructor, InstructorStatus};
use crate::storage::Storage;
use crate::utils::jwt::JwtUtils;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

fn instructor_cache_key(token: &str) -> String {
    format!("instructor:{token}")
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

async fn authenticate(req: &ServiceRequest) -> Result<Instructor, String> {
    let token = bearer_token(req.headers()).ok_or("Missing or invalid Authorization header")?;

    let claims = JwtUtils::verify_access_token(&token).map_err(|err| {
        info!("Access token rejected: {}", err);
        "Invalid access token".to_string()
    })?;

    let cache = req
        .app_data::<web::Data<Arc<dyn ObjectCache>>>()
        .map(|data| data.get_ref().clone());

    if let Some(cache) = &cache {
        match cache.get_json::<Instructor>(&instructor_cache_key(&token)).await {
            CacheResult::Found(instructor) => return Ok(instructor),
            CacheResult::ExistsButNoValue => cache.remove(&instructor_cache_key(&token)).await,
            CacheResult::NotFound => {}
        }
    }

    let storage = req
        .app_data::<web::Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or("Storage is not configured")?;

    let instructor_id = claims.instructor_id().map_err(|e| e.message().to_string())?;
    let instructor = storage
        .get_instructor_by_id(instructor_id)
        .await
        .map_err(|e| format!("Failed to load instructor: {e}"))?
        .ok_or("Instructor not found")?;

    if instructor.status != InstructorStatus::Active {
        return Err("Instructor account is suspended".to_string());
    }

    if let Some(cache) = &cache {
        cache
            .insert_json(
                instructor_cache_key(&token),
                &instructor,
                AppConfig::get().cache.default_ttl,
            )
            .await;
    }

    Ok(instructor)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
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
        Box::pin(async move {
            // CORS 预检直接放行
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            match authenticate(&req).await {
                Ok(instructor) => {
                    debug!("Authenticated instructor {}", instructor.id);
                    req.extensions_mut().insert(instructor);
                    Ok(srv.call(req).await?.map_into_left_body())
                }
                Err(err) => {
                    info!("Authentication failed for {}: {}", req.path(), err);
                    Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {err}"),
                        )
                        .map_into_right_body(),
                    ))
                }
            }
        })
    }
}

impl RequireJWT {
    /// 当前登录的教师，只在 RequireJWT 保护的路由中可用
    pub fn current_instructor(req: &HttpRequest) -> Option<Instructor> {
        req.extensions().get::<Instructor>().cloned()
    }

    /// 教师资料变更后丢弃当前 token 对应的缓存
    pub async fn forget_cached(req: &HttpRequest) {
        let Some(token) = bearer_token(req.headers()) else {
            return;
        };
        if let Some(cache) = req.app_data::<web::Data<Arc<dyn ObjectCache>>>() {
            cache.remove(&instructor_cache_key(&token)).await;
        }
    }
}
