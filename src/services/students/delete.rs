use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::StudentService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error};

pub async fn delete_student(
    service: &StudentService,
    request: &HttpRequest,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    // 学生为全局数据，仅管理员可删除
    if !instructor.is_admin() {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Only administrators can delete students",
        )));
    }
    let storage = service.get_storage(request);

    // 删除前记下照片路径
    let photo = match storage.get_student_photo(student_id).await {
        Ok(photo) => photo,
        Err(e) => return Ok(internal_error("Failed to load student", &e)),
    };

    match storage.delete_student(student_id).await {
        Ok(true) => {
            if let Some(photo) = photo
                && let Err(e) = std::fs::remove_file(&photo.image_path)
            {
                warn!("Failed to remove photo {}: {}", photo.image_path, e);
            }
            info!("Student {} deleted", student_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Student deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student not found",
        ))),
        Err(e) => Ok(internal_error("Student deletion failed", &e)),
    }
}
