use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::ApiResponse;
use crate::services::access::{current_instructor, load_course};

pub async fn get_course(
    service: &CourseService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match load_course(&storage, &instructor, course_id).await {
        Ok(course) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            course,
            "Course retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
