//! 教师对课程资源的访问校验
//!
//! 管理员可访问全部课程，任课教师只能访问自己名下的课程及其分组、课堂。
//! 校验失败时直接返回可发送给客户端的响应。

use actix_web::{HttpRequest, HttpResponse};
use std::sync::Arc;
use tracing::error;

use crate::errors::AttendanceError;
use crate::middlewares::RequireJWT;
use crate::models::courses::entities::Course;
use crate::models::groups::entities::Group;
use crate::models::instructors::entities::Instructor;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub(crate) fn current_instructor(request: &HttpRequest) -> Result<Instructor, HttpResponse> {
    RequireJWT::current_instructor(request).ok_or_else(|| {
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized: missing instructor",
        ))
    })
}

/// 课程查询范围，管理员为 None
pub(crate) fn owner_scope(instructor: &Instructor) -> Option<i64> {
    if instructor.is_admin() {
        None
    } else {
        Some(instructor.id)
    }
}

pub(crate) fn can_manage(instructor: &Instructor, course: &Course) -> bool {
    instructor.is_admin() || course.owner_id == instructor.id
}

pub(crate) fn internal_error(context: &str, err: &AttendanceError) -> HttpResponse {
    error!("{}: {}", context, err);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        format!("{context}: {err}"),
    ))
}

fn forbidden() -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(
        ErrorCode::Forbidden,
        "You do not have permission to access this course",
    ))
}

pub(crate) async fn load_course(
    storage: &Arc<dyn Storage>,
    instructor: &Instructor,
    course_id: i64,
) -> Result<Course, HttpResponse> {
    match storage.get_course_by_id(course_id).await {
        Ok(Some(course)) if can_manage(instructor, &course) => Ok(course),
        Ok(Some(_)) => Err(forbidden()),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::CourseNotFound,
            "Course not found",
        ))),
        Err(e) => Err(internal_error("Failed to load course", &e)),
    }
}

/// 读取分组及其所属课程
pub(crate) async fn load_group(
    storage: &Arc<dyn Storage>,
    instructor: &Instructor,
    group_id: i64,
) -> Result<(Group, Course), HttpResponse> {
    let group = match storage.get_group_by_id(group_id).await {
        Ok(Some(group)) => group,
        Ok(None) => {
            return Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::GroupNotFound,
                "Group not found",
            )));
        }
        Err(e) => return Err(internal_error("Failed to load group", &e)),
    };

    let course = load_course(storage, instructor, group.course_id).await?;
    Ok((group, course))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instructors::entities::{InstructorRole, InstructorStatus};

    fn instructor(id: i64, role: InstructorRole) -> Instructor {
        let now = chrono::Utc::now();
        Instructor {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: String::new(),
            role,
            status: InstructorStatus::Active,
            display_name: None,
            last_login: None,
            image_path: None,
            schedule_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn course(owner_id: i64) -> Course {
        let now = chrono::Utc::now();
        Course {
            id: 1,
            owner_id,
            code: "CS101".into(),
            name: "Intro".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_course_ownership() {
        let owner = instructor(1, InstructorRole::Instructor);
        let other = instructor(2, InstructorRole::Instructor);
        let admin = instructor(3, InstructorRole::Admin);

        assert!(can_manage(&owner, &course(1)));
        assert!(!can_manage(&other, &course(1)));
        assert!(can_manage(&admin, &course(1)));

        assert_eq!(owner_scope(&owner), Some(1));
        assert_eq!(owner_scope(&admin), None);
    }
}
