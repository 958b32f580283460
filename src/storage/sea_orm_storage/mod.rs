//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod attendance;
mod courses;
mod groups;
mod instructors;
mod lectures;
mod reconcile;
mod reports;
mod students;

use crate::config::AppConfig;
use crate::errors::{AttendanceError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite://") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| AttendanceError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| AttendanceError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| AttendanceError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 内存 SQLite 存储，单连接保证所有查询落在同一个库上
    #[cfg(test)]
    pub(crate) async fn new_in_memory() -> Result<Self> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AttendanceError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| AttendanceError::database_connection(format!("SQLite 连接失败: {e}")))?;

        let db = SqlxSqliteConnector::from_sqlx_sqlite_pool(pool);
        Migrator::up(&db, None)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("数据库迁移失败: {e}")))?;

        Ok(Self { db })
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite://") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") || url == ":memory:" {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(AttendanceError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}


#[cfg(test)]
pub(crate) mod test_support {
    //! 测试数据构造

    use super::SeaOrmStorage;
    use crate::models::{
        courses::entities::Course,
        groups::entities::Group,
        instructors::{entities::InstructorRole, requests::CreateInstructorRequest},
        students::{entities::Student, requests::CreateStudentRequest},
    };

    pub struct GroupFixture {
        pub owner_id: i64,
        pub course: Course,
        pub group: Group,
        pub students: Vec<Student>,
    }

    pub async fn instructor(storage: &SeaOrmStorage, username: &str) -> i64 {
        storage
            .create_instructor_impl(CreateInstructorRequest {
                username: username.to_string(),
                email: format!("{username}@uni.edu"),
                password: "hashed".to_string(),
                role: InstructorRole::Instructor,
                display_name: None,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn student(storage: &SeaOrmStorage, university_id: &str, name: &str) -> Student {
        storage
            .create_student_impl(CreateStudentRequest {
                university_id: university_id.to_string(),
                name: name.to_string(),
                gpa: None,
            })
            .await
            .unwrap()
    }

    /// 一位教师、一门课程 CS101、一个分组 G1，成员姓名为 "Student {学号}"
    pub async fn group_with_students(
        storage: &SeaOrmStorage,
        university_ids: &[&str],
    ) -> GroupFixture {
        let owner_id = instructor(storage, "owner").await;
        let course = storage
            .create_course_impl(owner_id, "CS101", "Intro to CS")
            .await
            .unwrap();
        let group = storage.create_group_impl(course.id, "G1").await.unwrap();

        let mut students = Vec::new();
        for id in university_ids {
            let s = student(storage, id, &format!("Student {id}")).await;
            storage.add_student_to_group_impl(group.id, s.id).await.unwrap();
            students.push(s);
        }

        GroupFixture {
            owner_id,
            course,
            group,
            students,
        }
    }
}

// Storage trait 实现
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
use crate::storage::Storage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 教师模块
    async fn create_instructor(&self, req: CreateInstructorRequest) -> Result<Instructor> {
        self.create_instructor_impl(req).await
    }

    async fn get_instructor_by_id(&self, id: i64) -> Result<Option<Instructor>> {
        self.get_instructor_by_id_impl(id).await
    }

    async fn get_instructor_by_username_or_email(
        &self,
        identifier: &str,
    ) -> Result<Option<Instructor>> {
        self.get_instructor_by_username_or_email_impl(identifier)
            .await
    }

    async fn list_instructors(&self) -> Result<Vec<Instructor>> {
        self.list_instructors_impl().await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn count_instructors(&self) -> Result<u64> {
        self.count_instructors_impl().await
    }

    async fn set_instructor_image(
        &self,
        instructor_id: i64,
        kind: InstructorImage,
        path: &str,
    ) -> Result<Option<String>> {
        self.set_instructor_image_impl(instructor_id, kind, path).await
    }

    // 课程模块
    async fn create_course(&self, owner_id: i64, code: &str, name: &str) -> Result<Course> {
        self.create_course_impl(owner_id, code, name).await
    }

    async fn get_course_by_id(&self, course_id: i64) -> Result<Option<Course>> {
        self.get_course_by_id_impl(course_id).await
    }

    async fn find_course_by_code(&self, owner_id: i64, code: &str) -> Result<Option<Course>> {
        self.find_course_by_code_impl(owner_id, code).await
    }

    async fn list_courses_with_pagination(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        self.list_courses_with_pagination_impl(query).await
    }

    async fn list_courses(&self, owner_id: Option<i64>) -> Result<Vec<Course>> {
        self.list_courses_impl(owner_id).await
    }

    async fn update_course(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        self.update_course_impl(course_id, update).await
    }

    async fn delete_course(&self, course_id: i64) -> Result<bool> {
        self.delete_course_impl(course_id).await
    }

    // 分组模块
    async fn create_group(&self, course_id: i64, name: &str) -> Result<Group> {
        self.create_group_impl(course_id, name).await
    }

    async fn get_group_by_id(&self, group_id: i64) -> Result<Option<Group>> {
        self.get_group_by_id_impl(group_id).await
    }

    async fn find_group_by_name(&self, course_id: i64, name: &str) -> Result<Option<Group>> {
        self.find_group_by_name_impl(course_id, name).await
    }

    async fn list_groups_by_course(&self, course_id: i64) -> Result<Vec<Group>> {
        self.list_groups_by_course_impl(course_id).await
    }

    async fn update_group(&self, group_id: i64, name: &str) -> Result<Option<Group>> {
        self.update_group_impl(group_id, name).await
    }

    async fn delete_group(&self, group_id: i64) -> Result<bool> {
        self.delete_group_impl(group_id).await
    }

    async fn list_group_students(&self, group_id: i64) -> Result<Vec<Student>> {
        self.list_group_students_impl(group_id).await
    }

    async fn add_student_to_group(&self, group_id: i64, student_id: i64) -> Result<bool> {
        self.add_student_to_group_impl(group_id, student_id).await
    }

    async fn remove_student_from_group(&self, group_id: i64, student_id: i64) -> Result<bool> {
        self.remove_student_from_group_impl(group_id, student_id).await
    }

    async fn count_groups_by_course(&self, course_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        self.count_groups_by_course_impl(course_ids).await
    }

    async fn count_group_students(&self, group_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        self.count_group_students_impl(group_ids).await
    }

    // 学生模块
    async fn create_student(&self, req: CreateStudentRequest) -> Result<Student> {
        self.create_student_impl(req).await
    }

    async fn get_student_by_id(&self, student_id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(student_id).await
    }

    async fn get_student_by_university_id(
        &self,
        university_id: &str,
    ) -> Result<Option<Student>> {
        self.get_student_by_university_id_impl(university_id).await
    }

    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(query).await
    }

    async fn search_students(&self, search: Option<&str>) -> Result<Vec<Student>> {
        self.search_students_impl(search).await
    }

    async fn update_student(
        &self,
        student_id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        self.update_student_impl(student_id, update).await
    }

    async fn delete_student(&self, student_id: i64) -> Result<bool> {
        self.delete_student_impl(student_id).await
    }

    async fn set_student_image(
        &self,
        student_id: i64,
        image_path: &str,
    ) -> Result<Option<String>> {
        self.set_student_image_impl(student_id, image_path).await
    }

    async fn set_student_face_id(&self, student_id: i64, face_id: &str) -> Result<bool> {
        self.set_student_face_id_impl(student_id, face_id).await
    }

    async fn list_students_with_photos(&self) -> Result<Vec<StudentPhoto>> {
        self.list_students_with_photos_impl().await
    }

    async fn get_student_photo(&self, student_id: i64) -> Result<Option<StudentPhoto>> {
        self.get_student_photo_impl(student_id).await
    }

    async fn list_student_groups(&self, student_id: i64) -> Result<Vec<GroupInfo>> {
        self.list_student_groups_impl(student_id).await
    }

    // 批量导入
    async fn reconcile_students(
        &self,
        scope: ReconcileScope,
        rows: Vec<ImportRow>,
    ) -> Result<ReconcileReport> {
        self.reconcile_students_impl(scope, rows).await
    }

    async fn reconcile_group_students(
        &self,
        group_id: i64,
        rows: Vec<ImportRow>,
    ) -> Result<ReconcileReport> {
        self.reconcile_group_students_impl(group_id, rows).await
    }

    // 课堂与考勤模块
    async fn list_lectures_with_pagination(
        &self,
        query: LectureListQuery,
    ) -> Result<LectureListResponse> {
        self.list_lectures_with_pagination_impl(query).await
    }

    async fn get_lecture_by_id(&self, lecture_id: i64) -> Result<Option<Lecture>> {
        self.get_lecture_by_id_impl(lecture_id).await
    }

    async fn get_lecture_detail(&self, lecture_id: i64) -> Result<Option<LectureDetail>> {
        self.get_lecture_detail_impl(lecture_id).await
    }

    async fn latest_lecture(&self, course_ids: &[i64]) -> Result<Option<Lecture>> {
        self.latest_lecture_impl(course_ids).await
    }

    async fn count_lectures_by_course(&self, course_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        self.count_lectures_by_course_impl(course_ids).await
    }

    async fn record_attendance(
        &self,
        group_id: i64,
        present: &HashSet<String>,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSummary> {
        self.record_attendance_impl(group_id, present, topic, now)
            .await
    }

    async fn record_face_attendance(
        &self,
        group_id: i64,
        university_id: &str,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<FaceAttendanceResult> {
        self.record_face_attendance_impl(group_id, university_id, topic, now)
            .await
    }

    async fn set_record_status(
        &self,
        lecture_id: i64,
        student_id: i64,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord> {
        self.set_record_status_impl(lecture_id, student_id, status)
            .await
    }

    // 报表模块
    async fn absence_counts(
        &self,
        course_ids: &[i64],
        student_ids: Option<&[i64]>,
    ) -> Result<HashMap<(i64, i64), i64>> {
        self.absence_counts_impl(course_ids, student_ids).await
    }

    async fn list_course_members(
        &self,
        course_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Student>>> {
        self.list_course_members_impl(course_ids).await
    }

    async fn student_course_absences(&self, student_id: i64) -> Result<Vec<CourseAbsence>> {
        self.student_course_absences_impl(student_id).await
    }

    async fn list_recent_attendance(
        &self,
        student_id: i64,
        limit: u64,
    ) -> Result<Vec<RecentAttendance>> {
        self.list_recent_attendance_impl(student_id, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::SeaOrmStorage;

    #[test]
    fn test_build_database_url() {
        assert_eq!(
            SeaOrmStorage::build_database_url("attendance.db").unwrap(),
            "sqlite://attendance.db?mode=rwc"
        );
        assert_eq!(
            SeaOrmStorage::build_database_url("postgres://u:p@localhost/att").unwrap(),
            "postgres://u:p@localhost/att"
        );
        assert!(SeaOrmStorage::build_database_url("oracle://nope").is_err());
    }
}
