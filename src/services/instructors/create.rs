use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::InstructorService;
use crate::models::instructors::requests::CreateInstructorRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::internal_error;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

pub async fn create_instructor(
    service: &InstructorService,
    request: &HttpRequest,
    mut data: CreateInstructorRequest,
) -> ActixResult<HttpResponse> {
    data.username = data.username.trim().to_string();
    data.email = data.email.trim().to_lowercase();

    let validation = validate_username(&data.username)
        .and_then(|_| validate_email(&data.email))
        .and_then(|_| validate_password(&data.password));
    if let Err(msg) = validation {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    let storage = service.get_storage(request);

    for identifier in [&data.username, &data.email] {
        match storage.get_instructor_by_username_or_email(identifier).await {
            Ok(None) => {}
            Ok(Some(_)) => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::InstructorAlreadyExists,
                    "Username or email already exists",
                )));
            }
            Err(e) => return Ok(internal_error("Failed to check instructor", &e)),
        }
    }

    // argon2 计算较重，放到阻塞线程池
    let password = std::mem::take(&mut data.password);
    data.password = match tokio::task::spawn_blocking(move || hash_password(&password)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => return Ok(internal_error("Password hashing failed", &e)),
        Err(e) => {
            error!("Password hashing task failed: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InstructorCreationFailed,
                    "Password hashing failed",
                )),
            );
        }
    };

    match storage.create_instructor(data).await {
        Ok(instructor) => {
            info!("Instructor {} created", instructor.username);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                instructor,
                "Instructor created successfully",
            )))
        }
        Err(e) => {
            error!("Instructor creation failed: {}", e);
            Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InstructorCreationFailed,
                    format!("Instructor creation failed: {e}"),
                )),
            )
        }
    }
}
