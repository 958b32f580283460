use crate::models::common::PaginationQuery;
use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct StudentQueryParams {
    #[serde(flatten)]
    #[ts(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct CreateStudentRequest {
    pub university_id: String,
    pub name: String,
    pub gpa: Option<f64>,
}

// 更新学生请求，学号不可修改
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub gpa: Option<f64>,
}

// 学生列表查询参数（用于存储层）
#[derive(Debug, Clone, Default)]
pub struct StudentListQuery {
    pub page: u64,
    pub size: u64,
    pub search: Option<String>,
}
