use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::StudentService;
use crate::models::students::requests::CreateStudentRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::internal_error;
use crate::utils::validate::{validate_gpa, validate_student_name, validate_university_id};

pub async fn create_student(
    service: &StudentService,
    request: &HttpRequest,
    data: CreateStudentRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let university_id = data.university_id.trim().to_string();
    let name = data.name.trim().to_string();
    if let Err(msg) = validate_university_id(&university_id) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UniversityIdInvalid, msg)));
    }
    if let Err(msg) = validate_student_name(&name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    if let Some(gpa) = data.gpa
        && let Err(msg) = validate_gpa(gpa)
    {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::StudentGpaInvalid, msg)));
    }

    match storage.get_student_by_university_id(&university_id).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::StudentAlreadyExists,
                format!("Student {university_id} already exists"),
            )));
        }
        Err(e) => return Ok(internal_error("Failed to check university id", &e)),
    }

    let req = CreateStudentRequest {
        university_id,
        name,
        gpa: data.gpa,
    };

    match storage.create_student(req).await {
        Ok(student) => {
            info!("Student {} created", student.university_id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(student, "Student created successfully")))
        }
        Err(e) => Ok(internal_error("Student creation failed", &e)),
    }
}
