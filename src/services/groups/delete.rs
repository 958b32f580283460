use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::GroupService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_group};

pub async fn delete_group(
    service: &GroupService,
    request: &HttpRequest,
    group_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    if let Err(resp) = load_group(&storage, &instructor, group_id).await {
        return Ok(resp);
    }

    match storage.delete_group(group_id).await {
        Ok(true) => {
            info!("Group {} deleted by instructor {}", group_id, instructor.id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Group deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GroupNotFound,
            "Group not found",
        ))),
        Err(e) => Ok(internal_error("Group deletion failed", &e)),
    }
}
