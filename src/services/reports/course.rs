use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReportService;
use super::aggregate::{attendance_percentage, is_warned};
use crate::config::AppConfig;
use crate::models::ApiResponse;
use crate::models::reports::responses::{CourseReportEntry, CourseReportResponse};
use crate::services::access::{current_instructor, internal_error, load_course};

pub async fn course_report(
    service: &ReportService,
    request: &HttpRequest,
    course_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let threshold = AppConfig::get().attendance.warning_threshold;

    let course = match load_course(&storage, &instructor, course_id).await {
        Ok(course) => course,
        Err(resp) => return Ok(resp),
    };

    let total_lectures = match storage.count_lectures_by_course(&[course_id]).await {
        Ok(counts) => counts.get(&course_id).copied().unwrap_or(0),
        Err(e) => return Ok(internal_error("Failed to count lectures", &e)),
    };
    let members = match storage.list_course_members(&[course_id]).await {
        Ok(mut members) => members.remove(&course_id).unwrap_or_default(),
        Err(e) => return Ok(internal_error("Failed to load course members", &e)),
    };
    let student_ids: Vec<i64> = members.iter().map(|s| s.id).collect();
    let counts = match storage.absence_counts(&[course_id], Some(student_ids.as_slice())).await {
        Ok(counts) => counts,
        Err(e) => return Ok(internal_error("Failed to count absences", &e)),
    };

    let mut students: Vec<CourseReportEntry> = members
        .into_iter()
        .map(|student| {
            let absences = counts.get(&(student.id, course_id)).copied().unwrap_or(0);
            CourseReportEntry {
                attendance_percentage: attendance_percentage(total_lectures, absences),
                is_warned: is_warned(absences, threshold),
                absences,
                student,
            }
        })
        .collect();
    // 缺勤多的排在前面，稳定排序保留学号顺序
    students.sort_by(|a, b| b.absences.cmp(&a.absences));

    let response = CourseReportResponse {
        course,
        total_lectures,
        threshold,
        students,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Course report retrieved successfully")))
}
