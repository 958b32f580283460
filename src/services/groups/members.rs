use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::GroupService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_group};

pub async fn add_member(
    service: &GroupService,
    request: &HttpRequest,
    group_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    if let Err(resp) = load_group(&storage, &instructor, group_id).await {
        return Ok(resp);
    }

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

    match storage.add_student_to_group(group_id, student_id).await {
        Ok(true) => {
            info!("Student {} added to group {}", student_id, group_id);
            Ok(HttpResponse::Created().json(ApiResponse::success_empty("Student added to group")))
        }
        Ok(false) => Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
            "Student is already a member of this group",
        ))),
        Err(e) => Ok(internal_error("Failed to add student to group", &e)),
    }
}

pub async fn remove_member(
    service: &GroupService,
    request: &HttpRequest,
    group_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    if let Err(resp) = load_group(&storage, &instructor, group_id).await {
        return Ok(resp);
    }

    match storage.remove_student_from_group(group_id, student_id).await {
        Ok(true) => {
            info!("Student {} removed from group {}", student_id, group_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student removed from group")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student is not a member of this group",
        ))),
        Err(e) => Ok(internal_error("Failed to remove student from group", &e)),
    }
}
