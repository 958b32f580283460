use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::auth::{requests::LoginRequest, responses::LoginResponse};
use crate::models::instructors::entities::InstructorStatus;
use crate::models::{ApiResponse, ErrorCode};
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

use super::AuthService;

fn login_failed() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::AuthFailed,
        "Username or password is incorrect",
    ))
}

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let config = service.get_config();

    let identifier = login_request.username.trim();
    if identifier.is_empty() || login_request.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Username and password are required",
        )));
    }

    let instructor = match storage.get_instructor_by_username_or_email(identifier).await {
        Ok(Some(instructor)) => instructor,
        Ok(None) => return Ok(login_failed()),
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Login failed: {e}"),
                )),
            );
        }
    };

    if !verify_password(&login_request.password, &instructor.password_hash) {
        return Ok(login_failed());
    }

    if instructor.status != InstructorStatus::Active {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            "This account has been suspended",
        )));
    }

    if let Err(e) = storage.update_last_login(instructor.id).await {
        tracing::warn!("Failed to update last login for {}: {}", instructor.id, e);
    }

    let refresh_days = if login_request.remember_me {
        config.jwt.refresh_token_remember_me_expiry
    } else {
        config.jwt.refresh_token_expiry
    };

    let token_pair = match instructor.generate_token_pair(Some(chrono::Duration::days(refresh_days))) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Failed to generate JWT token: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed, unable to generate token",
                )),
            );
        }
    };

    tracing::info!("Instructor {} logged in", instructor.username);

    let refresh_cookie = JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token, refresh_days);
    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: config.jwt.access_token_expiry * 60,
        instructor,
        created_at: chrono::Utc::now(),
    };

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Login successful")))
}
