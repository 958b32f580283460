use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 一次课堂（某分组在某时刻的一次课）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "lecture.ts")]
pub struct Lecture {
    pub id: i64,
    pub course_id: i64,
    pub group_id: i64,
    pub date_time: chrono::DateTime<chrono::Utc>,
    pub topic: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
