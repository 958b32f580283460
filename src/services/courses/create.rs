use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::models::courses::requests::CreateCourseRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error};
use crate::utils::validate::validate_course_code;

pub async fn create_course(
    service: &CourseService,
    request: &HttpRequest,
    data: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let code = data.code.trim();
    let name = data.name.trim();
    if let Err(msg) = validate_course_code(code) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::ValidationFailed,
            "Course name must not be empty",
        )));
    }

    // 只有管理员可以替其他教师创建课程
    let owner_id = match data.owner_id {
        Some(owner_id) if owner_id != instructor.id => {
            if !instructor.is_admin() {
                return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                    ErrorCode::Forbidden,
                    "You cannot create a course for another instructor",
                )));
            }
            match storage.get_instructor_by_id(owner_id).await {
                Ok(Some(_)) => owner_id,
                Ok(None) => {
                    return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                        ErrorCode::InstructorNotFound,
                        "Instructor not found",
                    )));
                }
                Err(e) => return Ok(internal_error("Failed to load instructor", &e)),
            }
        }
        _ => instructor.id,
    };

    match storage.find_course_by_code(owner_id, code).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::CourseAlreadyExists,
                format!("Course {code} already exists"),
            )));
        }
        Err(e) => return Ok(internal_error("Failed to check course code", &e)),
    }

    match storage.create_course(owner_id, code, name).await {
        Ok(course) => {
            info!("Course {} created by instructor {}", course.code, instructor.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(course, "Course created successfully")))
        }
        Err(e) => Ok(internal_error("Course creation failed", &e)),
    }
}
