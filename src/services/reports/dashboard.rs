use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ReportService;
use super::aggregate::{member_absences, summarize};
use crate::config::AppConfig;
use crate::models::ApiResponse;
use crate::models::reports::responses::DashboardResponse;
use crate::services::access::{current_instructor, internal_error, owner_scope};

pub async fn dashboard(
    service: &ReportService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let threshold = AppConfig::get().attendance.warning_threshold;

    let courses = match storage.list_courses(owner_scope(&instructor)).await {
        Ok(courses) => courses,
        Err(e) => return Ok(internal_error("Failed to load courses", &e)),
    };
    let course_ids: Vec<i64> = courses.iter().map(|c| c.id).collect();

    let latest_lecture = match storage.latest_lecture(&course_ids).await {
        Ok(lecture) => lecture,
        Err(e) => return Ok(internal_error("Failed to load latest lecture", &e)),
    };
    let members = match storage.list_course_members(&course_ids).await {
        Ok(members) => members,
        Err(e) => return Ok(internal_error("Failed to load course members", &e)),
    };
    let counts = match storage.absence_counts(&course_ids, None).await {
        Ok(counts) => counts,
        Err(e) => return Ok(internal_error("Failed to count absences", &e)),
    };

    let mut warned_students: Vec<_> = member_absences(&courses, &members, &counts)
        .into_iter()
        .map(|(student, absences)| summarize(student, &absences, threshold))
        .filter(|summary| summary.is_under_warning)
        .collect();
    warned_students.sort_by(|a, b| b.total_absences.cmp(&a.total_absences));

    let response = DashboardResponse {
        course_count: courses.len() as u64,
        latest_lecture,
        threshold,
        warned_students,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Dashboard retrieved successfully")))
}
