use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::auth::responses::{InstructorInfoResponse, RefreshTokenResponse};
use crate::models::instructors::entities::InstructorStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::current_instructor;
use crate::utils::jwt::JwtUtils;

use super::AuthService;

fn login_again(message: &str) -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(ErrorCode::Unauthorized, message))
}

pub async fn handle_refresh_token(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let config = service.get_config();

    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(login_again("Unauthorized access, please login"));
    };

    let claims = match JwtUtils::verify_refresh_token(&refresh_token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::info!("Refresh token rejected: {}", e);
            return Ok(login_again("Login expired or invalid, please login again"));
        }
    };

    // 账号被停用或删除后，refresh token 立即失效
    let storage = service.get_storage(request);
    let instructor = match claims.instructor_id() {
        Ok(id) => storage.get_instructor_by_id(id).await,
        Err(e) => Err(e),
    };
    let instructor = match instructor {
        Ok(Some(instructor)) if instructor.status == InstructorStatus::Active => instructor,
        Ok(_) => return Ok(login_again("Login expired or invalid, please login again")),
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Failed to refresh token: {e}"),
                )),
            );
        }
    };

    match JwtUtils::generate_access_token(instructor.id, &instructor.role.to_string()) {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: config.jwt.access_token_expiry * 60,
            },
            "Token refreshed successfully",
        ))),
        Err(e) => {
            tracing::error!("Failed to generate access token: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Unable to generate token",
                )),
            )
        }
    }
}

pub async fn handle_me(request: &HttpRequest) -> ActixResult<HttpResponse> {
    match current_instructor(request) {
        Ok(instructor) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            InstructorInfoResponse { instructor },
            "Instructor information retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
