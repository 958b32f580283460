use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::StudentService;
use crate::config::AppConfig;
use crate::models::students::responses::PhotoUploadResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::internal_error;
use crate::utils::image_store::{check_image, discard_replaced, discard_stored, store_image};
use crate::utils::multipart::read_upload_form;

pub async fn upload_photo(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();
    let storage = service.get_storage(request);

    match storage.get_student_by_id(student_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => return Ok(internal_error("Failed to load student", &e)),
    }

    let form = match read_upload_form(&mut payload, config.upload.max_size).await {
        Ok(form) => form,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(e.error_code(), e.message())));
        }
    };

    let extension = form.extension();
    if let Err(msg) = check_image(&form.file_bytes, &extension, &config.upload.allowed_types) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::FileTypeNotAllowed, msg)));
    }

    let stored_path = match store_image(&config.upload.dir, "students", &extension, &form.file_bytes)
    {
        Ok(path) => path,
        Err(e) => {
            error!("{}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::FileUploadFailed,
                "Failed to store photo",
            )));
        }
    };

    match storage.set_student_image(student_id, &stored_path).await {
        Ok(previous) => {
            discard_replaced(previous, &stored_path);
            info!("Photo stored for student {} at {}", student_id, stored_path);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                PhotoUploadResponse {
                    student_id,
                    stored_as: stored_path,
                },
                "Photo uploaded successfully",
            )))
        }
        Err(e) => {
            discard_stored(&stored_path);
            if e.is_not_found() {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::StudentNotFound,
                    "Student not found",
                )));
            }
            Ok(internal_error("Failed to record photo", &e))
        }
    }
}
