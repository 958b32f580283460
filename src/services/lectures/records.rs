use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::LectureService;
use crate::models::attendance::requests::UpdateRecordRequest;
use crate::models::attendance::responses::AttendanceRecordResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_course};

/// 修改单条考勤状态，记录不存在时补建
pub async fn update_record(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
    student_id: i64,
    data: UpdateRecordRequest,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let lecture = match storage.get_lecture_by_id(lecture_id).await {
        Ok(Some(lecture)) => lecture,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::LectureNotFound,
                "Lecture not found",
            )));
        }
        Err(e) => return Ok(internal_error("Failed to load lecture", &e)),
    };
    if let Err(resp) = load_course(&storage, &instructor, lecture.course_id).await {
        return Ok(resp);
    }

    match storage
        .set_record_status(lecture_id, student_id, data.status)
        .await
    {
        Ok(record) => {
            info!(
                "Record for student {} in lecture {} set to {} by instructor {}",
                student_id, lecture_id, record.status, instructor.id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                AttendanceRecordResponse { record },
                "Attendance record updated",
            )))
        }
        Err(e) if e.is_not_found() => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student not found",
        ))),
        Err(e) => Ok(internal_error("Failed to update attendance record", &e)),
    }
}
