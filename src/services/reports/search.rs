use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::{HashMap, HashSet};

use super::ReportService;
use super::aggregate::{member_absences, summarize};
use crate::config::AppConfig;
use crate::models::ApiResponse;
use crate::models::reports::requests::StudentSearchParams;
use crate::models::reports::responses::{StudentSearchEntry, StudentSearchResponse};
use crate::services::access::{current_instructor, internal_error, owner_scope};

pub async fn search_students(
    service: &ReportService,
    request: &HttpRequest,
    params: StudentSearchParams,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let threshold = AppConfig::get().attendance.warning_threshold;
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    // 缺勤只统计当前教师可见的课程
    let courses = match storage.list_courses(owner_scope(&instructor)).await {
        Ok(courses) => courses,
        Err(e) => return Ok(internal_error("Failed to load courses", &e)),
    };
    let visible: HashSet<i64> = courses.iter().map(|c| c.id).collect();

    // 学号精确命中
    if let Some(q) = query {
        match storage.get_student_by_university_id(q).await {
            Ok(Some(student)) => {
                let absences = match storage.student_course_absences(student.id).await {
                    Ok(absences) => absences
                        .into_iter()
                        .filter(|a| visible.contains(&a.course_id))
                        .collect::<Vec<_>>(),
                    Err(e) => return Ok(internal_error("Failed to load absences", &e)),
                };
                let entry = StudentSearchEntry {
                    summary: summarize(student, &absences, threshold),
                    courses: absences,
                };
                return Ok(HttpResponse::Ok().json(ApiResponse::success(
                    StudentSearchResponse {
                        exact_match: true,
                        items: vec![entry],
                    },
                    "Student found",
                )));
            }
            Ok(None) => {}
            Err(e) => return Ok(internal_error("Failed to search students", &e)),
        }
    }

    let students = match storage.search_students(query).await {
        Ok(students) => students,
        Err(e) => return Ok(internal_error("Failed to search students", &e)),
    };
    let course_ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
    let student_ids: Vec<i64> = students.iter().map(|s| s.id).collect();

    let members = match storage.list_course_members(&course_ids).await {
        Ok(members) => members,
        Err(e) => return Ok(internal_error("Failed to load course members", &e)),
    };
    let counts = match storage.absence_counts(&course_ids, Some(student_ids.as_slice())).await {
        Ok(counts) => counts,
        Err(e) => return Ok(internal_error("Failed to count absences", &e)),
    };

    let mut enrolled: HashMap<i64, Vec<_>> = member_absences(&courses, &members, &counts)
        .into_iter()
        .map(|(student, absences)| (student.id, absences))
        .collect();

    let items = students
        .into_iter()
        .map(|student| {
            let absences = enrolled.remove(&student.id).unwrap_or_default();
            StudentSearchEntry {
                summary: summarize(student, &absences, threshold),
                courses: absences,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        StudentSearchResponse {
            exact_match: false,
            items,
        },
        "Student search completed",
    )))
}
