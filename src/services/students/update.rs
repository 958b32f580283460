use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::StudentService;
use crate::models::students::requests::UpdateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::internal_error;
use crate::utils::validate::{validate_gpa, validate_student_name};

pub async fn update_student(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
    data: UpdateStudentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    if let Some(name) = &data.name
        && let Err(msg) = validate_student_name(name.trim())
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    if let Some(gpa) = data.gpa
        && let Err(msg) = validate_gpa(gpa)
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::StudentGpaInvalid, msg)));
    }

    match storage.update_student(student_id, data).await {
        Ok(Some(student)) => {
            info!("Student {} updated", student.university_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(student, "Student updated successfully")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student not found",
        ))),
        Err(e) => Ok(internal_error("Student update failed", &e)),
    }
}
