//! 学生存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::courses::{Column as CourseColumn, Entity as Courses};
use crate::entity::group_students::{Column as LinkColumn, Entity as GroupStudents};
use crate::entity::groups::{Column as GroupColumn, Entity as Groups};
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    students::{
        entities::{Student, StudentPhoto},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::{GroupInfo, StudentListResponse},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};

/// 姓名或学号模糊匹配
fn search_filter(select: Select<Students>, search: Option<&str>) -> Select<Students> {
    match search.map(str::trim) {
        Some(search) if !search.is_empty() => {
            let escaped = escape_like_pattern(search);
            select.filter(
                Condition::any()
                    .add(Column::Name.contains(&escaped))
                    .add(Column::UniversityId.contains(&escaped)),
            )
        }
        _ => select,
    }
}

impl SeaOrmStorage {
    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            university_id: Set(req.university_id.trim().to_string()),
            name: Set(req.name.trim().to_string()),
            gpa: Set(req.gpa),
            image_path: Set(None),
            face_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建学生失败: {e}")))?;

        Ok(result.into_student())
    }

    pub async fn get_student_by_id_impl(&self, student_id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    pub async fn get_student_by_university_id_impl(
        &self,
        university_id: &str,
    ) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::UniversityId.eq(university_id.trim()))
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, 100);

        let select = search_filter(Students::find(), query.search.as_deref());
        let paginator = select
            .order_by_asc(Column::UniversityId)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生总数失败: {e}")))?;

        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(StudentListResponse {
            items: students.into_iter().map(|m| m.into_student()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 不分页的学生检索，空查询返回全部学生
    pub async fn search_students_impl(&self, search: Option<&str>) -> Result<Vec<Student>> {
        let students = search_filter(Students::find(), search)
            .order_by_asc(Column::UniversityId)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("检索学生失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    /// 更新姓名或 GPA，学号不可修改
    pub async fn update_student_impl(
        &self,
        student_id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        if self.get_student_by_id_impl(student_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(student_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }

        if let Some(gpa) = update.gpa {
            model.gpa = Set(Some(gpa));
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新学生失败: {e}")))?;

        Ok(Some(result.into_student()))
    }

    pub async fn delete_student_impl(&self, student_id: i64) -> Result<bool> {
        let result = Students::delete_by_id(student_id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除学生失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 记录学生照片路径，返回旧路径
    pub async fn set_student_image_impl(
        &self,
        student_id: i64,
        image_path: &str,
    ) -> Result<Option<String>> {
        let existing = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?
            .ok_or_else(|| AttendanceError::not_found(format!("学生 {student_id} 不存在")))?;

        let previous = existing.image_path.clone();
        let mut model: ActiveModel = existing.into();
        model.image_path = Set(Some(image_path.to_string()));
        // 照片更换后原人脸模板失效
        model.face_id = Set(None);
        model.updated_at = Set(chrono::Utc::now().timestamp());

        model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新学生照片失败: {e}")))?;

        Ok(previous)
    }

    pub async fn set_student_face_id_impl(&self, student_id: i64, face_id: &str) -> Result<bool> {
        let result = Students::update_many()
            .col_expr(Column::FaceId, sea_orm::sea_query::Expr::value(face_id))
            .filter(Column::Id.eq(student_id))
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新人脸模板失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 所有已上传照片的学生
    pub async fn list_students_with_photos_impl(&self) -> Result<Vec<StudentPhoto>> {
        let students = Students::find()
            .filter(Column::ImagePath.is_not_null())
            .order_by_asc(Column::UniversityId)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生照片失败: {e}")))?;

        Ok(students
            .into_iter()
            .filter_map(|m| {
                m.image_path.map(|image_path| StudentPhoto {
                    student_id: m.id,
                    university_id: m.university_id,
                    image_path,
                })
            })
            .collect())
    }

    pub async fn get_student_photo_impl(&self, student_id: i64) -> Result<Option<StudentPhoto>> {
        let student = Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(student.and_then(|m| {
            m.image_path.map(|image_path| StudentPhoto {
                student_id: m.id,
                university_id: m.university_id,
                image_path,
            })
        }))
    }

    /// 学生所在的分组及其课程
    pub async fn list_student_groups_impl(&self, student_id: i64) -> Result<Vec<GroupInfo>> {
        let group_ids: Vec<i64> = GroupStudents::find()
            .select_only()
            .column(LinkColumn::GroupId)
            .filter(LinkColumn::StudentId.eq(student_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生分组失败: {e}")))?;

        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let groups = Groups::find()
            .filter(GroupColumn::Id.is_in(group_ids))
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组失败: {e}")))?;

        let course_ids: Vec<i64> = groups.iter().map(|g| g.course_id).collect();
        let courses: HashMap<i64, _> = Courses::find()
            .filter(CourseColumn::Id.is_in(course_ids))
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课程失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut infos: Vec<GroupInfo> = groups
            .into_iter()
            .filter_map(|g| {
                courses.get(&g.course_id).map(|c| GroupInfo {
                    group_name: g.name,
                    course_name: c.name.clone(),
                    course_code: c.code.clone(),
                })
            })
            .collect();
        infos.sort_by(|a, b| a.course_code.cmp(&b.course_code));

        Ok(infos)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SeaOrmStorage, test_support};
    use crate::models::students::requests::{StudentListQuery, UpdateStudentRequest};

    #[tokio::test]
    async fn test_update_student_keeps_university_id() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let student = test_support::student(&storage, "123", "Ali").await;

        let updated = storage
            .update_student_impl(
                student.id,
                UpdateStudentRequest {
                    name: Some("Ali Hassan".to_string()),
                    gpa: Some(3.2),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.university_id, "123");
        assert_eq!(updated.name, "Ali Hassan");
        assert_eq!(updated.gpa, Some(3.2));
    }

    #[tokio::test]
    async fn test_search_students_by_name_or_id() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        test_support::student(&storage, "2021001", "Mona").await;
        test_support::student(&storage, "2021002", "Omar").await;
        test_support::student(&storage, "2020999", "Monica").await;

        assert_eq!(storage.search_students_impl(Some("mon")).await.unwrap().len(), 2);
        assert_eq!(storage.search_students_impl(Some("2021")).await.unwrap().len(), 2);
        assert_eq!(storage.search_students_impl(None).await.unwrap().len(), 3);

        let page = storage
            .list_students_with_pagination_impl(StudentListQuery {
                page: 2,
                size: 2,
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_photo_and_face_id() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let student = test_support::student(&storage, "123", "Ali").await;
        test_support::student(&storage, "456", "Bea").await;

        let previous = storage
            .set_student_image_impl(student.id, "uploads/a.jpg")
            .await
            .unwrap();
        assert!(previous.is_none());

        let photos = storage.list_students_with_photos_impl().await.unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].university_id, "123");

        let photo = storage.get_student_photo_impl(student.id).await.unwrap().unwrap();
        assert_eq!(photo.image_path, "uploads/a.jpg");
        assert!(storage.get_student_photo_impl(9999).await.unwrap().is_none());

        assert!(storage.set_student_face_id_impl(student.id, "face-1").await.unwrap());
        let reloaded = storage.get_student_by_id_impl(student.id).await.unwrap().unwrap();
        assert!(reloaded.has_photo);
        assert_eq!(reloaded.face_id.as_deref(), Some("face-1"));

        let missing = storage.set_student_image_impl(9999, "x.jpg").await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_student_groups_info() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        let group = storage.create_group_impl(course.id, "G1").await.unwrap();
        let student = test_support::student(&storage, "123", "Ali").await;
        storage.add_student_to_group_impl(group.id, student.id).await.unwrap();

        let infos = storage.list_student_groups_impl(student.id).await.unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].group_name, "G1");
        assert_eq!(infos[0].course_code, "CS101");
    }
}
