use super::entities::Lecture;
use crate::models::attendance::entities::AttendanceStatus;
use crate::models::common::PaginationInfo;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "lecture.ts")]
pub struct LectureListResponse {
    pub pagination: PaginationInfo,
    pub items: Vec<Lecture>,
}

// 课堂名单中的一条考勤
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "lecture.ts")]
pub struct LectureRecordEntry {
    pub student_id: i64,
    pub university_id: String,
    pub student_name: String,
    pub status: AttendanceStatus,
}

// 课堂详情：课堂信息与完整考勤名单
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "lecture.ts")]
pub struct LectureDetail {
    pub lecture: Lecture,
    pub course_code: String,
    pub course_name: String,
    pub group_name: String,
    pub owner_id: i64,
    pub records: Vec<LectureRecordEntry>,
}
