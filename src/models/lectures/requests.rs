use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "lecture.ts")]
pub struct LectureQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub course_id: Option<i64>,
    pub group_id: Option<i64>,
}

// 课堂列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct LectureListQuery {
    pub page: u64,
    pub size: u64,
    pub course_id: Option<i64>,
    pub group_id: Option<i64>,
    // 非管理员只能看到自己课程的课堂
    pub owner_id: Option<i64>,
}

// 导出格式
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "lecture.ts")]
pub enum ExportFormat {
    #[default]
    Html,
    Xlsx,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "lecture.ts")]
pub struct ExportParams {
    #[serde(default)]
    pub format: ExportFormat,
}
