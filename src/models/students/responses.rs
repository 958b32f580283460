use super::entities::Student;
use crate::models::attendance::entities::AttendanceStatus;
use crate::models::common::PaginationInfo;
use crate::models::reports::responses::WarningCourseDetail;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct StudentListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<Student>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct PhotoUploadResponse {
    pub student_id: i64,
    pub stored_as: String,
}

// 学生所在分组
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct GroupInfo {
    pub group_name: String,
    pub course_name: String,
    pub course_code: String,
}

// 最近的考勤记录
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct RecentAttendance {
    pub lecture_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub topic: String,
    pub date_time: chrono::DateTime<chrono::Utc>,
    pub status: AttendanceStatus,
}

// 公开的学生档案
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "student.ts")]
pub struct StudentProfileResponse {
    pub id: i64,
    pub name: String,
    pub university_id: String,
    pub gpa: Option<f64>,
    pub groups_info: Vec<GroupInfo>,
    pub recent_attendance: Vec<RecentAttendance>,
    pub is_under_warning: bool,
    pub warning_courses_details: Vec<WarningCourseDetail>,
}
