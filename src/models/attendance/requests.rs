use super::entities::AttendanceStatus;
use serde::Deserialize;
use ts_rs::TS;

// 人脸考勤请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct FaceAttendanceRequest {
    /// data URL（data:image/...;base64,...）或纯 base64
    pub image: String,
    pub group_id: i64,
    pub topic: Option<String>,
}

// 修改单条考勤状态
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct UpdateRecordRequest {
    pub status: AttendanceStatus,
}
