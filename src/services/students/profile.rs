use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::config::AppConfig;
use crate::models::students::responses::StudentProfileResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::internal_error;
use crate::services::reports::aggregate::warning_courses;

pub async fn get_public_profile(
    service: &StudentService,
    request: &HttpRequest,
    university_id: &str,
) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();
    let storage = service.get_storage(request);

    let student = match storage.get_student_by_university_id(university_id).await {
        Ok(Some(student)) => student,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => return Ok(internal_error("Failed to load student", &e)),
    };

    let groups_info = match storage.list_student_groups(student.id).await {
        Ok(groups) => groups,
        Err(e) => return Ok(internal_error("Failed to load student groups", &e)),
    };
    let recent_attendance = match storage
        .list_recent_attendance(student.id, config.attendance.recent_records_limit)
        .await
    {
        Ok(records) => records,
        Err(e) => return Ok(internal_error("Failed to load attendance", &e)),
    };
    let absences = match storage.student_course_absences(student.id).await {
        Ok(absences) => absences,
        Err(e) => return Ok(internal_error("Failed to load absences", &e)),
    };

    let warnings = warning_courses(&absences, config.attendance.warning_threshold);
    let profile = StudentProfileResponse {
        id: student.id,
        name: student.name,
        university_id: student.university_id,
        gpa: student.gpa,
        groups_info,
        recent_attendance,
        is_under_warning: !warnings.is_empty(),
        warning_courses_details: warnings,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(profile, "Student profile retrieved")))
}
