use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::LectureService;
use crate::models::instructors::entities::Instructor;
use crate::models::lectures::responses::LectureDetail;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error};
use crate::storage::Storage;

/// 读取课堂详情并校验归属
pub(crate) async fn load_lecture_detail(
    storage: &Arc<dyn Storage>,
    instructor: &Instructor,
    lecture_id: i64,
) -> Result<LectureDetail, HttpResponse> {
    match storage.get_lecture_detail(lecture_id).await {
        Ok(Some(detail)) if instructor.is_admin() || detail.owner_id == instructor.id => Ok(detail),
        Ok(Some(_)) => Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "You do not have permission to access this lecture",
        ))),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::LectureNotFound,
            "Lecture not found",
        ))),
        Err(e) => Err(internal_error("Failed to load lecture", &e)),
    }
}

pub async fn get_lecture(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    match load_lecture_detail(&storage, &instructor, lecture_id).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "Lecture retrieved successfully",
        ))),
        Err(resp) => Ok(resp),
    }
}
