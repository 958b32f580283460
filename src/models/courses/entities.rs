use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct Course {
    pub id: i64,
    // 负责教师ID
    pub owner_id: i64,
    // 课程代码，同一教师下唯一
    pub code: String,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
