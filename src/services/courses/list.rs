use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::models::ApiResponse;
use crate::models::courses::requests::{CourseListQuery, CourseQueryParams};
use crate::services::access::{current_instructor, internal_error, owner_scope};

pub async fn list_courses(
    service: &CourseService,
    request: &HttpRequest,
    query: CourseQueryParams,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let (page, size) = query.pagination.normalized();
    let list_query = CourseListQuery {
        page,
        size,
        owner_id: owner_scope(&instructor),
        search: query.search,
    };

    match storage.list_courses_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Course list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to retrieve course list", &e)),
    }
}
