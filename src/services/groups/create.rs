use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::GroupService;
use crate::models::groups::requests::CreateGroupRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_course};
use crate::utils::validate::validate_group_name;

pub async fn create_group(
    service: &GroupService,
    request: &HttpRequest,
    course_id: i64,
    data: CreateGroupRequest,
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

    let name = data.name.trim();
    if let Err(msg) = validate_group_name(name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    match storage.find_group_by_name(course.id, name).await {
        Ok(None) => {}
        Ok(Some(_)) => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::GroupAlreadyExists,
                format!("Group {name} already exists in {}", course.code),
            )));
        }
        Err(e) => return Ok(internal_error("Failed to check group name", &e)),
    }

    match storage.create_group(course.id, name).await {
        Ok(group) => {
            info!("Group {} created in course {}", group.name, course.code);
            Ok(HttpResponse::Created().json(ApiResponse::success(group, "Group created successfully")))
        }
        Err(e) => Ok(internal_error("Group creation failed", &e)),
    }
}
