use crate::models::courses::entities::Course;
use crate::models::lectures::entities::Lecture;
use crate::models::students::entities::Student;
use serde::Serialize;
use ts_rs::TS;

// 学生在某门课程的缺勤次数
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "report.ts")]
pub struct CourseAbsence {
    pub course_id: i64,
    pub course_code: String,
    pub course_name: String,
    pub absences: i64,
}

// 达到预警阈值的课程
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "report.ts")]
pub struct WarningCourseDetail {
    pub course_code: String,
    pub course_name: String,
    pub absences_count: i64,
    pub threshold: i64,
}

// 学生预警汇总
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct StudentWarningSummary {
    pub student: Student,
    // 如 "Safe (0)"、"High Risk (2 Courses)"
    pub label: String,
    pub is_under_warning: bool,
    pub total_absences: i64,
    pub warning_courses: Vec<WarningCourseDetail>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct DashboardResponse {
    pub course_count: u64,
    pub latest_lecture: Option<Lecture>,
    pub threshold: i64,
    pub warned_students: Vec<StudentWarningSummary>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct CourseReportEntry {
    pub student: Student,
    pub absences: i64,
    pub attendance_percentage: f64,
    pub is_warned: bool,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct CourseReportResponse {
    pub course: Course,
    pub total_lectures: i64,
    pub threshold: i64,
    pub students: Vec<CourseReportEntry>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct StudentSearchEntry {
    #[serde(flatten)]
    #[ts(flatten)]
    pub summary: StudentWarningSummary,
    pub courses: Vec<CourseAbsence>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct StudentSearchResponse {
    // 学号精确命中时只返回该学生
    pub exact_match: bool,
    pub items: Vec<StudentSearchEntry>,
}
