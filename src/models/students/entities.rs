use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct Student {
    pub id: i64,
    // 学号，创建后不可修改
    pub university_id: String,
    pub name: String,
    pub gpa: Option<f64>,
    pub has_photo: bool,
    // 人脸库中的模板引用
    pub face_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// 带照片路径的学生，用于人脸库同步
#[derive(Debug, Clone)]
pub struct StudentPhoto {
    pub student_id: i64,
    pub university_id: String,
    pub image_path: String,
}
