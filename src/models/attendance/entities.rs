use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 考勤状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "attendance.ts")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub const PRESENT: &'static str = "present";
    pub const ABSENT: &'static str = "absent";
    pub const LATE: &'static str = "late";
    pub const EXCUSED: &'static str = "excused";

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => Self::PRESENT,
            AttendanceStatus::Absent => Self::ABSENT,
            AttendanceStatus::Late => Self::LATE,
            AttendanceStatus::Excused => Self::EXCUSED,
        }
    }

    /// 报表中显示的文字
    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        }
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttendanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            Self::PRESENT => Ok(AttendanceStatus::Present),
            Self::ABSENT => Ok(AttendanceStatus::Absent),
            Self::LATE => Ok(AttendanceStatus::Late),
            Self::EXCUSED => Ok(AttendanceStatus::Excused),
            _ => Err(format!("Invalid attendance status: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "attendance.ts")]
pub struct AttendanceRecord {
    pub id: i64,
    pub lecture_id: i64,
    pub student_id: i64,
    pub status: AttendanceStatus,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip_strings() {
        for status in [
            AttendanceStatus::Present,
            AttendanceStatus::Absent,
            AttendanceStatus::Late,
            AttendanceStatus::Excused,
        ] {
            assert_eq!(status.as_str().parse::<AttendanceStatus>(), Ok(status));
        }
        assert!("missing".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn test_status_serde_is_snake_case() {
        let json = serde_json::to_string(&AttendanceStatus::Excused).unwrap();
        assert_eq!(json, r#""excused""#);
        assert_eq!(AttendanceStatus::Late.label(), "Late");
    }
}
