use super::entities::Course;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

// 课程列表项：课程及其分组数、学生人数（去重）
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseListItem {
    #[serde(flatten)]
    pub course: Course,
    pub group_count: i64,
    pub total_students: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<CourseListItem>,
}
