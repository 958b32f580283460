use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::models::ApiResponse;
use crate::models::students::requests::{StudentListQuery, StudentQueryParams};
use crate::services::access::internal_error;

pub async fn list_students(
    service: &StudentService,
    request: &HttpRequest,
    query: StudentQueryParams,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let (page, size) = query.pagination.normalized();
    let list_query = StudentListQuery {
        page,
        size,
        search: query.search,
    };

    match storage.list_students_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Student list retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to retrieve student list", &e)),
    }
}
