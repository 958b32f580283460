use super::entities::Group;
use crate::models::students::entities::Student;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct GroupListItem {
    #[serde(flatten)]
    pub group: Group,
    pub student_count: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct GroupListResponse {
    pub items: Vec<GroupListItem>,
}

// 分组名单中的一行：学生及其在本课程的缺勤次数
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct GroupRosterEntry {
    pub student: Student,
    pub absences: i64,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct GroupRosterResponse {
    pub group: Group,
    pub course_code: String,
    pub course_name: String,
    pub students: Vec<GroupRosterEntry>,
}
