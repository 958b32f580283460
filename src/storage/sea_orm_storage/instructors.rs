//! 教师账号存储操作

use super::SeaOrmStorage;
use crate::entity::instructors::{ActiveModel, Column, Entity as Instructors};
use crate::errors::{AttendanceError, Result};
use crate::models::instructors::{
    entities::{Instructor, InstructorImage, InstructorStatus},
    requests::CreateInstructorRequest,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    /// 创建教师账号，`password` 须为已哈希的密码
    pub async fn create_instructor_impl(&self, req: CreateInstructorRequest) -> Result<Instructor> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(InstructorStatus::Active.to_string()),
            display_name: Set(req.display_name),
            last_login: Set(None),
            image_path: Set(None),
            schedule_path: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建教师失败: {e}")))?;

        Ok(result.into_instructor())
    }

    pub async fn get_instructor_by_id_impl(&self, id: i64) -> Result<Option<Instructor>> {
        let result = Instructors::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教师失败: {e}")))?;

        Ok(result.map(|m| m.into_instructor()))
    }

    /// 通过用户名或邮箱获取教师
    pub async fn get_instructor_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<Instructor>> {
        let result = Instructors::find()
            .filter(
                Condition::any()
                    .add(Column::Username.eq(identifier))
                    .add(Column::Email.eq(identifier)),
            )
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教师失败: {e}")))?;

        Ok(result.map(|m| m.into_instructor()))
    }

    pub async fn list_instructors_impl(&self) -> Result<Vec<Instructor>> {
        let result = Instructors::find()
            .order_by_asc(Column::Username)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教师列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_instructor()).collect())
    }

    /// 更新最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Instructors::update_many()
            .col_expr(Column::LastLogin, sea_orm::sea_query::Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                AttendanceError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    /// 记录头像或课表图片路径，返回旧路径
    pub async fn set_instructor_image_impl(
        &self,
        instructor_id: i64,
        kind: InstructorImage,
        path: &str,
    ) -> Result<Option<String>> {
        let existing = Instructors::find_by_id(instructor_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询教师失败: {e}")))?
            .ok_or_else(|| AttendanceError::not_found(format!("教师 {instructor_id} 不存在")))?;

        let previous = match kind {
            InstructorImage::Avatar => existing.image_path.clone(),
            InstructorImage::Schedule => existing.schedule_path.clone(),
        };

        let mut model: ActiveModel = existing.into();
        match kind {
            InstructorImage::Avatar => model.image_path = Set(Some(path.to_string())),
            InstructorImage::Schedule => model.schedule_path = Set(Some(path.to_string())),
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());

        model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新教师图片失败: {e}")))?;

        Ok(previous)
    }

    pub async fn count_instructors_impl(&self) -> Result<u64> {
        Instructors::find()
            .count(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("统计教师数量失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::super::SeaOrmStorage;
    use super::super::test_support;
    use crate::models::instructors::{
        entities::{InstructorImage, InstructorRole},
        requests::CreateInstructorRequest,
    };

    #[tokio::test]
    async fn test_create_and_lookup_instructor() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        assert_eq!(storage.count_instructors_impl().await.unwrap(), 0);

        let created = storage
            .create_instructor_impl(CreateInstructorRequest {
                username: "lee".to_string(),
                email: "lee@uni.edu".to_string(),
                password: "hashed".to_string(),
                role: InstructorRole::Instructor,
                display_name: None,
            })
            .await
            .unwrap();

        let by_email = storage
            .get_instructor_by_username_or_email_impl("lee@uni.edu")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, created.id);
        assert!(!by_email.is_admin());

        assert!(storage.update_last_login_impl(created.id).await.unwrap());
        let reloaded = storage
            .get_instructor_by_id_impl(created.id)
            .await
            .unwrap()
            .unwrap();
        assert!(reloaded.last_login.is_some());
    }

    #[tokio::test]
    async fn test_set_instructor_image_returns_previous() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let id = test_support::instructor(&storage, "lee").await;

        let first = storage
            .set_instructor_image_impl(id, InstructorImage::Avatar, "uploads/avatars/a.png")
            .await
            .unwrap();
        assert_eq!(first, None);

        let replaced = storage
            .set_instructor_image_impl(id, InstructorImage::Avatar, "uploads/avatars/b.png")
            .await
            .unwrap();
        assert_eq!(replaced.as_deref(), Some("uploads/avatars/a.png"));

        // 课表与头像互不影响
        let schedule = storage
            .set_instructor_image_impl(id, InstructorImage::Schedule, "uploads/schedules/s.png")
            .await
            .unwrap();
        assert_eq!(schedule, None);

        let reloaded = storage.get_instructor_by_id_impl(id).await.unwrap().unwrap();
        assert_eq!(reloaded.image_path.as_deref(), Some("uploads/avatars/b.png"));
        assert_eq!(reloaded.schedule_path.as_deref(), Some("uploads/schedules/s.png"));

        let missing = storage
            .set_instructor_image_impl(9999, InstructorImage::Avatar, "x.png")
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }
}
