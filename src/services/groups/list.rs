use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::GroupService;
use crate::models::ApiResponse;
use crate::models::groups::responses::{GroupListItem, GroupListResponse};
use crate::services::access::{current_instructor, internal_error, load_course};

pub async fn list_groups(
    service: &GroupService,
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

    let groups = match storage.list_groups_by_course(course_id).await {
        Ok(groups) => groups,
        Err(e) => return Ok(internal_error("Failed to retrieve group list", &e)),
    };

    let group_ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
    let counts = match storage.count_group_students(&group_ids).await {
        Ok(counts) => counts,
        Err(e) => return Ok(internal_error("Failed to count group members", &e)),
    };

    let items = groups
        .into_iter()
        .map(|group| GroupListItem {
            student_count: counts.get(&group.id).copied().unwrap_or(0),
            group,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        GroupListResponse { items },
        "Group list retrieved successfully",
    )))
}
