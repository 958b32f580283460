use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

// 课程查询参数（来自HTTP请求）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

// 创建课程请求
//
// owner_id 仅管理员可指定，教师创建时总是归属自己
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CreateCourseRequest {
    pub code: String,
    pub name: String,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct UpdateCourseRequest {
    pub code: Option<String>,
    pub name: Option<String>,
}

// 课程列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct CourseListQuery {
    pub page: u64,
    pub size: u64,
    pub owner_id: Option<i64>,
    pub search: Option<String>,
}
