/*!
 * 基于角色的访问控制中间件
 *
 * 必须挂在 RequireJWT 之内，依赖其写入请求扩展的教师信息。
 *
 * ```rust,ignore
 * web::resource("")
 *     .route(web::post().to(create_instructor)
 *         .wrap(RequireRole::new_any(InstructorRole::admin_roles())))
 * ```
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::info;

use super::create_error_response;
use crate::models::ErrorCode;
use crate::models::instructors::entities::{Instructor, InstructorRole};

#[derive(Clone)]
pub struct RequireRole {
    allowed_roles: Vec<InstructorRole>,
}

impl RequireRole {
    pub fn new(role: &InstructorRole) -> Self {
        Self {
            allowed_roles: vec![role.clone()],
        }
    }

    /// 具备任一角色即可通过
    pub fn new_any(roles: &[&InstructorRole]) -> Self {
        Self {
            allowed_roles: roles.iter().map(|r| (*r).clone()).collect(),
        }
    }

    fn permits(allowed: &[InstructorRole], role: &InstructorRole) -> bool {
        allowed.contains(role)
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireRoleMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleMiddleware {
            service: Rc::new(service),
            allowed_roles: Rc::new(self.allowed_roles.clone()),
        }))
    }
}

pub struct RequireRoleMiddleware<S> {
    service: Rc<S>,
    allowed_roles: Rc<Vec<InstructorRole>>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleMiddleware<S>
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
        let allowed_roles = self.allowed_roles.clone();

        Box::pin(async move {
            let caller = req
                .extensions()
                .get::<Instructor>()
                .map(|i| (i.id, i.role.clone()));

            let (status, message) = match caller {
                Some((_, role)) if RequireRole::permits(&allowed_roles, &role) => {
                    return Ok(srv.call(req).await?.map_into_left_body());
                }
                Some((id, role)) => {
                    info!(
                        "Access denied for instructor {} (role: {}), allowed: {:?}",
                        id, role, allowed_roles
                    );
                    (StatusCode::FORBIDDEN, "Access denied")
                }
                None => {
                    info!("Role check without an authenticated instructor on {}", req.path());
                    (StatusCode::UNAUTHORIZED, "Authentication required")
                }
            };

            let code = if status == StatusCode::FORBIDDEN {
                ErrorCode::Forbidden
            } else {
                ErrorCode::Unauthorized
            };
            Ok(req.into_response(create_error_response(status, code, message).map_into_right_body()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_membership() {
        let admin_only = RequireRole::new_any(InstructorRole::admin_roles());
        assert!(RequireRole::permits(&admin_only.allowed_roles, &InstructorRole::Admin));
        assert!(!RequireRole::permits(
            &admin_only.allowed_roles,
            &InstructorRole::Instructor
        ));

        let single = RequireRole::new(&InstructorRole::Instructor);
        assert!(RequireRole::permits(&single.allowed_roles, &InstructorRole::Instructor));
    }
}
