use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 课程下的学生分组
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct Group {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
