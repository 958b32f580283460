use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::LectureService;
use crate::models::ApiResponse;
use crate::models::lectures::requests::{LectureListQuery, LectureQueryParams};
use crate::services::access::{current_instructor, internal_error, owner_scope};

pub async fn list_lectures(
    service: &LectureService,
    request: &HttpRequest,
    query: LectureQueryParams,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let (page, size) = query.pagination.normalized();
    let list_query = LectureListQuery {
        page,
        size,
        course_id: query.course_id,
        group_id: query.group_id,
        owner_id: owner_scope(&instructor),
    };

    match storage.list_lectures_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Lecture list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to retrieve lecture list", &e)),
    }
}
