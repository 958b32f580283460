use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::GroupService;
use crate::models::ApiResponse;
use crate::models::groups::responses::{GroupRosterEntry, GroupRosterResponse};
use crate::services::access::{current_instructor, internal_error, load_group};

pub async fn group_roster(
    service: &GroupService,
    request: &HttpRequest,
    group_id: i64,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let (group, course) = match load_group(&storage, &instructor, group_id).await {
        Ok(loaded) => loaded,
        Err(resp) => return Ok(resp),
    };

    let students = match storage.list_group_students(group.id).await {
        Ok(students) => students,
        Err(e) => return Ok(internal_error("Failed to load group members", &e)),
    };
    let student_ids: Vec<i64> = students.iter().map(|s| s.id).collect();
    let counts = match storage.absence_counts(&[course.id], Some(student_ids.as_slice())).await {
        Ok(counts) => counts,
        Err(e) => return Ok(internal_error("Failed to count absences", &e)),
    };

    let students = students
        .into_iter()
        .map(|student| GroupRosterEntry {
            absences: counts.get(&(student.id, course.id)).copied().unwrap_or(0),
            student,
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        GroupRosterResponse {
            group,
            course_code: course.code,
            course_name: course.name,
            students,
        },
        "Group roster retrieved successfully",
    )))
}
