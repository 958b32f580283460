use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::info;

use super::AttendanceService;
use crate::config::AppConfig;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_group};
use crate::utils::multipart::read_upload_form;
use crate::utils::roster::parse_roster;

const ROSTER_EXTENSIONS: [&str; 2] = [".csv", ".txt"];

pub async fn roster_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    group_id: i64,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let config = AppConfig::get();

    let (group, course) = match load_group(&storage, &instructor, group_id).await {
        Ok(loaded) => loaded,
        Err(resp) => return Ok(resp),
    };

    let form = match read_upload_form(&mut payload, config.import.max_file_size).await {
        Ok(form) => form,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(e.error_code(), e.message())));
        }
    };
    if !ROSTER_EXTENSIONS.contains(&form.extension().as_str()) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::FileTypeNotAllowed,
            "Roster must be a .csv or .txt file",
        )));
    }

    let present = match parse_roster(&form.file_bytes, &form.file_name) {
        Ok(present) => present,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(e.error_code(), e.message())));
        }
    };
    let topic = form
        .field("topic")
        .unwrap_or(config.attendance.default_topic.as_str())
        .to_string();

    match storage
        .record_attendance(group.id, &present, &topic, Utc::now())
        .await
    {
        Ok(summary) => {
            info!(
                "Attendance taken for {} / {}: {} present, {} absent, {} unmatched",
                course.code,
                group.name,
                summary.present,
                summary.absent,
                summary.unmatched.len()
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(summary, "Attendance recorded")))
        }
        Err(e) if e.is_not_found() => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::GroupNotFound,
            "Group not found",
        ))),
        Err(e) => Ok(internal_error("Failed to record attendance", &e)),
    }
}
