use super::entities::AttendanceRecord;
use serde::Serialize;
use ts_rs::TS;

// 名单考勤结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct AttendanceSummary {
    pub lecture_id: i64,
    pub present: u64,
    pub absent: u64,
    pub total: u64,
    // 名单文件中不属于该分组的学号
    pub unmatched: Vec<String>,
}

// 人脸考勤落库结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct FaceAttendanceResult {
    pub student_id: i64,
    pub student_name: String,
    pub university_id: String,
    pub lecture_id: i64,
    pub lecture_created: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct FaceAttendanceResponse {
    #[serde(flatten)]
    #[ts(flatten)]
    pub result: FaceAttendanceResult,
    pub similarity: f64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct FaceSyncResponse {
    pub enrolled: u64,
    pub failed: u64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct AttendanceRecordResponse {
    pub record: AttendanceRecord,
}
