use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

use super::InstructorService;
use crate::models::ApiResponse;
use crate::models::instructors::responses::{
    InstructorListItem, InstructorListResponse, TaughtCourse,
};
use crate::services::access::internal_error;

/// 教师列表，每位教师附带其名下课程（按名称排序）及各课程分组数
pub async fn list_instructors(
    service: &InstructorService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let instructors = match storage.list_instructors().await {
        Ok(instructors) => instructors,
        Err(e) => return Ok(internal_error("Failed to list instructors", &e)),
    };
    let courses = match storage.list_courses(None).await {
        Ok(courses) => courses,
        Err(e) => return Ok(internal_error("Failed to list courses", &e)),
    };

    let course_ids: Vec<i64> = courses.iter().map(|c| c.id).collect();
    let group_counts = match storage.count_groups_by_course(&course_ids).await {
        Ok(counts) => counts,
        Err(e) => return Ok(internal_error("Failed to count groups", &e)),
    };

    let mut taught: HashMap<i64, Vec<TaughtCourse>> = HashMap::new();
    for course in courses {
        taught.entry(course.owner_id).or_default().push(TaughtCourse {
            group_count: group_counts.get(&course.id).copied().unwrap_or(0),
            id: course.id,
            code: course.code,
            name: course.name,
        });
    }

    let items = instructors
        .into_iter()
        .map(|instructor| {
            let mut courses = taught.remove(&instructor.id).unwrap_or_default();
            courses.sort_by(|a, b| a.name.cmp(&b.name));
            InstructorListItem {
                course_count: courses.len() as i64,
                courses,
                instructor,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        InstructorListResponse { items },
        "Instructor list retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, test_support};
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_instructors_carry_their_courses() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["123"]).await;
        storage
            .create_course_impl(fx.owner_id, "AI300", "Applied AI")
            .await
            .unwrap();
        let idle = test_support::instructor(&storage, "idle").await;
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let service = InstructorService {
            storage: Some(storage),
        };
        let req = TestRequest::default().to_http_request();
        let resp = list_instructors(&service, &req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let items = json["data"]["items"].as_array().unwrap();

        let owner = items.iter().find(|i| i["id"] == fx.owner_id).unwrap();
        assert_eq!(owner["course_count"], 2);
        // 按课程名称排序
        assert_eq!(owner["courses"][0]["code"], "AI300");
        assert_eq!(owner["courses"][0]["group_count"], 0);
        assert_eq!(owner["courses"][1]["code"], "CS101");
        assert_eq!(owner["courses"][1]["group_count"], 1);

        let idle = items.iter().find(|i| i["id"] == idle).unwrap();
        assert_eq!(idle["course_count"], 0);
        assert!(idle["courses"].as_array().unwrap().is_empty());
    }
}
