use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::GroupService;
use crate::models::groups::requests::UpdateGroupRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_group};
use crate::utils::validate::validate_group_name;

pub async fn update_group(
    service: &GroupService,
    request: &HttpRequest,
    group_id: i64,
    data: UpdateGroupRequest,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let (group, _) = match load_group(&storage, &instructor, group_id).await {
        Ok(loaded) => loaded,
        Err(resp) => return Ok(resp),
    };

    let name = data.name.trim();
    if let Err(msg) = validate_group_name(name) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::ValidationFailed, msg)));
    }

    match storage.find_group_by_name(group.course_id, name).await {
        Ok(Some(other)) if other.id != group.id => {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::GroupAlreadyExists,
                format!("Group {name} already exists"),
            )));
        }
        Ok(_) => {}
        Err(e) => return Ok(internal_error("Failed to check group name", &e)),
    }

    match storage.update_group(group_id, name).await {
        Ok(Some(group)) => Ok(HttpResponse::Ok().json(ApiResponse::success(group, "Group updated successfully"))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GroupNotFound,
            "Group not found",
        ))),
        Err(e) => Ok(internal_error("Group update failed", &e)),
    }
}
