use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    attendance::{
        entities::{AttendanceRecord, AttendanceStatus},
        responses::{AttendanceSummary, FaceAttendanceResult},
    },
    courses::{
        entities::Course,
        requests::{CourseListQuery, UpdateCourseRequest},
        responses::CourseListResponse,
    },
    groups::entities::Group,
    imports::{ImportRow, ReconcileReport, ReconcileScope},
    instructors::{
        entities::{Instructor, InstructorImage},
        requests::CreateInstructorRequest,
    },
    lectures::{
        entities::Lecture,
        requests::LectureListQuery,
        responses::{LectureDetail, LectureListResponse},
    },
    reports::responses::CourseAbsence,
    students::{
        entities::{Student, StudentPhoto},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::{GroupInfo, RecentAttendance, StudentListResponse},
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 教师账号
    // 创建教师（密码须已哈希）
    async fn create_instructor(&self, req: CreateInstructorRequest) -> Result<Instructor>;
    async fn get_instructor_by_id(&self, id: i64) -> Result<Option<Instructor>>;
    // 通过用户名或邮箱获取教师
    async fn get_instructor_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Instructor>>;
    async fn list_instructors(&self) -> Result<Vec<Instructor>>;
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    async fn count_instructors(&self) -> Result<u64>;
    // 记录头像或课表图片路径，返回旧路径
    async fn set_instructor_image(
        &self,
        instructor_id: i64,
        kind: InstructorImage,
        path: &str,
    ) -> Result<Option<String>>;

    /// 课程
    async fn create_course(&self, owner_id: i64, code: &str, name: &str) -> Result<Course>;
    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>>;
    // 在教师名下按代码查找课程（不区分大小写）
    async fn find_course_by_code(&self, owner_id: i64, code: &str) -> Result<Option<Course>>;
    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse>;
    // 列出课程，owner_id 为空时列出全部
    async fn list_courses(&self, owner_id: Option<i64>) -> Result<Vec<Course>>;
    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>>;
    async fn delete_course(&self, course_id: i64) -> Result<bool>;

    /// 分组
    async fn create_group(&self, course_id: i64, name: &str) -> Result<Group>;
    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>>;
    async fn find_group_by_name(&self, course_id: i64, name: &str) -> Result<Option<Group>>;
    async fn list_groups_by_course(&self, course_id: i64) -> Result<Vec<Group>>;
    async fn update_group(&self, group_id: i64, name: &str) -> Result<Option<Group>>;
    async fn delete_group(&self, group_id: i64) -> Result<bool>;
    // 分组成员，按学号排序
    async fn list_group_students(&self, group_id: i64) -> Result<Vec<Student>>;
    // 已是成员时返回 false
    async fn add_student_to_group(&self, group_id: i64, student_id: i64) -> Result<bool>;
    async fn remove_student_from_group(&self, group_id: i64, student_id: i64) -> Result<bool>;
    async fn count_groups_by_course(&self, course_ids: &[i64]) -> Result<HashMap<i64, i64>>;
    async fn count_group_students(&self, group_ids: &[i64]) -> Result<HashMap<i64, i64>>;

    /// 学生
    async fn create_student(&self, req: CreateStudentRequest) -> Result<Student>;
    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>>;
    async fn get_student_by_university_id(&self, university_id: &str)
    -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    async fn search_students(&self, search: Option<&str>) -> Result<Vec<Student>>;
    async fn update_student(
        &self,
        student_id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>>;
    async fn delete_student(&self, student_id: i64) -> Result<bool>;
    // 记录照片路径，返回旧路径
    async fn set_student_image(&self, student_id: i64, image_path: &str)
    -> Result<Option<String>>;
    async fn set_student_face_id(&self, student_id: i64, face_id: &str) -> Result<bool>;
    async fn list_students_with_photos(&self) -> Result<Vec<StudentPhoto>>;
    async fn get_student_photo(&self, student_id: i64) -> Result<Option<StudentPhoto>>;
    async fn list_student_groups(&self, student_id: i64) -> Result<Vec<GroupInfo>>;

    /// 批量导入
    async fn reconcile_students(
        &self,
        scope: ReconcileScope,
        rows: Vec<ImportRow>,
    ) -> Result<ReconcileReport>;
    async fn reconcile_group_students(
        &self,
        group_id: i64,
        rows: Vec<ImportRow>,
    ) -> Result<ReconcileReport>;

    /// 课堂与考勤
    async fn list_lectures_with_pagination(
        &self,
        query: LectureListQuery,
    ) -> Result<LectureListResponse>;
    async fn get_lecture_by_id(&self, lecture_id: i64) -> Result<Option<Lecture>>;
    async fn get_lecture_detail(&self, lecture_id: i64) -> Result<Option<LectureDetail>>;
    async fn latest_lecture(&self, course_ids: &[i64]) -> Result<Option<Lecture>>;
    async fn count_lectures_by_course(&self, course_ids: &[i64]) -> Result<HashMap<i64, i64>>;
    // 名单考勤：新建课堂并为每位成员写入记录
    async fn record_attendance(
        &self,
        group_id: i64,
        present: &HashSet<String>,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSummary>;
    // 人脸考勤：按 (分组, UTC 日, 主题) 复用课堂
    async fn record_face_attendance(
        &self,
        group_id: i64,
        university_id: &str,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<FaceAttendanceResult>;
    async fn set_record_status(
        &self,
        lecture_id: i64,
        student_id: i64,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord>;

    /// 报表
    // (学生ID, 课程ID) -> 缺勤次数
    async fn absence_counts(
        &self,
        course_ids: &[i64],
        student_ids: Option<&[i64]>,
    ) -> Result<HashMap<(i64, i64), i64>>;
    async fn list_course_members(&self, course_ids: &[i64])
    -> Result<HashMap<i64, Vec<Student>>>;
    async fn student_course_absences(&self, student_id: i64) -> Result<Vec<CourseAbsence>>;
    async fn list_recent_attendance(
        &self,
        student_id: i64,
        limit: u64,
    ) -> Result<Vec<RecentAttendance>>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
