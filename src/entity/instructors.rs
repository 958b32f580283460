//! 教师实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "instructors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub display_name: Option<String>,
    pub last_login: Option<i64>,
    pub image_path: Option<String>,
    pub schedule_path: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::courses::Entity")]
    Courses,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_instructor(self) -> crate::models::instructors::entities::Instructor {
        use crate::models::instructors::entities::{
            Instructor, InstructorRole, InstructorStatus,
        };
        use chrono::{DateTime, Utc};

        Instructor {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self
                .role
                .parse::<InstructorRole>()
                .unwrap_or(InstructorRole::Instructor),
            status: self
                .status
                .parse::<InstructorStatus>()
                .unwrap_or(InstructorStatus::Active),
            display_name: self.display_name,
            last_login: self
                .last_login
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            image_path: self.image_path,
            schedule_path: self.schedule_path,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
