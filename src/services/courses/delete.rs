use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_course};

pub async fn delete_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    if let Err(resp) = load_course(&storage, &instructor, course_id).await {
        return Ok(resp);
    }

    match storage.delete_course(course_id).await {
        Ok(true) => {
            info!("Course {} deleted by instructor {}", course_id, instructor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Course deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseNotFound,
            "Course not found",
        ))),
        Err(e) => Ok(internal_error("Course deletion failed", &e)),
    }
}
