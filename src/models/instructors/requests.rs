use super::entities::InstructorRole;
use serde::Deserialize;
use ts_rs::TS;

// 创建教师账号请求（仅管理员）
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "instructor.ts")]
pub struct CreateInstructorRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: InstructorRole,
    pub display_name: Option<String>,
}
