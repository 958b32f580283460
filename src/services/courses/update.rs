use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::courses::requests::UpdateCourseRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_course};
use crate::utils::validate::validate_course_code;

pub async fn update_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
    mut data: UpdateCourseRequest,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let course = match load_course(&storage, &instructor, course_id).await {
        Ok(course) => course,
        Err(resp) => return Ok(resp),
    };

    if let Some(code) = data.code.as_deref().map(str::trim) {
        if let Err(msg) = validate_course_code(code) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
        }

        match storage.find_course_by_code(course.owner_id, code).await {
            Ok(Some(existing)) if existing.id != course.id => {
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::CourseAlreadyExists,
                    format!("Course {code} already exists"),
                )));
            }
            Ok(_) => {}
            Err(e) => return Ok(internal_error("Failed to check course code", &e)),
        }
    }

    if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        data.name = None;
    }

    match storage.update_course(course_id, data).await {
        Ok(Some(course)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            course,
            "Course updated successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseNotFound,
            "Course not found",
        ))),
        Err(e) => Ok(internal_error("Course update failed", &e)),
    }
}
