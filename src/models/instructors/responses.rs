use super::entities::{Instructor, InstructorImage};
use serde::Serialize;
use ts_rs::TS;

// 教师名下的一门课程
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "instructor.ts")]
pub struct TaughtCourse {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub group_count: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "instructor.ts")]
pub struct InstructorListItem {
    #[serde(flatten)]
    pub instructor: Instructor,
    pub course_count: i64,
    pub courses: Vec<TaughtCourse>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "instructor.ts")]
pub struct InstructorListResponse {
    pub items: Vec<InstructorListItem>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "instructor.ts")]
pub struct InstructorImageResponse {
    pub kind: InstructorImage,
    pub stored_as: String,
}
