//! 课程存储操作

use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    courses::{
        entities::Course,
        requests::{CourseListQuery, UpdateCourseRequest},
        responses::{CourseListItem, CourseListResponse},
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    pub async fn create_course_impl(&self, owner_id: i64, code: &str, name: &str) -> Result<Course> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            owner_id: Set(owner_id),
            code: Set(code.trim().to_string()),
            name: Set(name.trim().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_course())
    }

    pub async fn get_course_by_id_impl(&self, course_id: i64) -> Result<Option<Course>> {
        let result = Courses::find_by_id(course_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_course()))
    }

    /// 在某位教师名下按课程代码查找（不区分大小写）
    pub async fn find_course_by_code_impl(
        &self,
        owner_id: i64,
        code: &str,
    ) -> Result<Option<Course>> {
        let wanted = code.trim().to_lowercase();
        let courses = Courses::find()
            .filter(Column::OwnerId.eq(owner_id))
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(courses
            .into_iter()
            .find(|m| m.code.to_lowercase() == wanted)
            .map(|m| m.into_course()))
    }

    /// 分页列出课程，附带分组数与学生人数
    pub async fn list_courses_with_pagination_impl(
        &self,
        query: CourseListQuery,
    ) -> Result<CourseListResponse> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, 100);

        let mut select = Courses::find();

        if let Some(owner_id) = query.owner_id {
            select = select.filter(Column::OwnerId.eq(owner_id));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Code.contains(&escaped))
                    .add(Column::Name.contains(&escaped)),
            );
        }

        let paginator = select.order_by_asc(Column::Code).paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课程总数失败: {e}")))?;

        let courses = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课程列表失败: {e}")))?;

        let course_ids: Vec<i64> = courses.iter().map(|m| m.id).collect();
        let group_counts = self.count_groups_by_course_impl(&course_ids).await?;
        let student_counts = self.count_course_students_impl(&course_ids).await?;

        Ok(CourseListResponse {
            items: courses
                .into_iter()
                .map(|m| CourseListItem {
                    group_count: group_counts.get(&m.id).copied().unwrap_or(0),
                    total_students: student_counts.get(&m.id).copied().unwrap_or(0),
                    course: m.into_course(),
                })
                .collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 列出课程，`owner_id` 为空时列出全部
    pub async fn list_courses_impl(&self, owner_id: Option<i64>) -> Result<Vec<Course>> {
        let mut select = Courses::find();
        if let Some(owner_id) = owner_id {
            select = select.filter(Column::OwnerId.eq(owner_id));
        }

        let courses = select
            .order_by_asc(Column::Code)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课程列表失败: {e}")))?;

        Ok(courses.into_iter().map(|m| m.into_course()).collect())
    }

    pub async fn update_course_impl(
        &self,
        course_id: i64,
        update: UpdateCourseRequest,
    ) -> Result<Option<Course>> {
        if self.get_course_by_id_impl(course_id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(course_id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(code) = update.code {
            model.code = Set(code.trim().to_string());
        }

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新课程失败: {e}")))?;

        self.get_course_by_id_impl(course_id).await
    }

    /// 删除课程，分组与课堂随之级联删除
    pub async fn delete_course_impl(&self, course_id: i64) -> Result<bool> {
        let result = Courses::delete_by_id(course_id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除课程失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SeaOrmStorage, test_support};
    use crate::models::courses::requests::{CourseListQuery, UpdateCourseRequest};

    #[tokio::test]
    async fn test_find_course_by_code_ignores_case() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();

        let found = storage
            .find_course_by_code_impl(owner, "cs101")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, course.id);

        let other = test_support::instructor(&storage, "bo").await;
        assert!(
            storage
                .find_course_by_code_impl(other, "CS101")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_list_and_update_courses() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let other = test_support::instructor(&storage, "bo").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        storage.create_course_impl(other, "MA201", "Algebra").await.unwrap();
        let group = storage.create_group_impl(course.id, "G1").await.unwrap();
        let student = test_support::student(&storage, "100", "Ali").await;
        storage.add_student_to_group_impl(group.id, student.id).await.unwrap();

        let own = storage
            .list_courses_with_pagination_impl(CourseListQuery {
                page: 1,
                size: 10,
                owner_id: Some(owner),
                search: None,
            })
            .await
            .unwrap();
        assert_eq!(own.items.len(), 1);
        assert_eq!(own.pagination.total, 1);
        assert_eq!(own.items[0].course.code, "CS101");
        assert_eq!(own.items[0].group_count, 1);
        assert_eq!(own.items[0].total_students, 1);
        assert_eq!(storage.list_courses_impl(None).await.unwrap().len(), 2);

        let updated = storage
            .update_course_impl(
                course.id,
                UpdateCourseRequest {
                    code: None,
                    name: Some("Introduction".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.code, "CS101");
        assert_eq!(updated.name, "Introduction");

        assert!(storage.delete_course_impl(course.id).await.unwrap());
        assert!(storage.get_course_by_id_impl(course.id).await.unwrap().is_none());
    }
}
