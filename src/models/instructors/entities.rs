use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 教师角色
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "instructor.ts")]
pub enum InstructorRole {
    Instructor, // 任课教师，只能管理自己的课程
    Admin,      // 管理员，可管理全部课程
}

impl InstructorRole {
    pub const INSTRUCTOR: &'static str = "instructor";
    pub const ADMIN: &'static str = "admin";

    pub fn admin_roles() -> &'static [&'static InstructorRole] {
        &[&Self::Admin]
    }
}

impl<'de> Deserialize<'de> for InstructorRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的教师角色: '{s}'. 支持的角色: instructor, admin"
            ))
        })
    }
}

impl std::fmt::Display for InstructorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructorRole::Instructor => write!(f, "{}", InstructorRole::INSTRUCTOR),
            InstructorRole::Admin => write!(f, "{}", InstructorRole::ADMIN),
        }
    }
}

impl std::str::FromStr for InstructorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            InstructorRole::INSTRUCTOR => Ok(InstructorRole::Instructor),
            InstructorRole::ADMIN => Ok(InstructorRole::Admin),
            _ => Err(format!("Invalid instructor role: {s}")),
        }
    }
}

// 账号状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "instructor.ts")]
pub enum InstructorStatus {
    Active,
    Suspended,
}

impl std::fmt::Display for InstructorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructorStatus::Active => write!(f, "active"),
            InstructorStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for InstructorStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(InstructorStatus::Active),
            "suspended" => Ok(InstructorStatus::Suspended),
            _ => Err(format!("Invalid instructor status: {s}")),
        }
    }
}

// 教师个人图片的种类
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "instructor.ts")]
pub enum InstructorImage {
    Avatar,
    Schedule,
}

impl InstructorImage {
    /// 上传目录下的子目录
    pub fn dir_name(self) -> &'static str {
        match self {
            InstructorImage::Avatar => "avatars",
            InstructorImage::Schedule => "schedules",
        }
    }
}

// 教师实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "instructor.ts")]
pub struct Instructor {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub role: InstructorRole,
    pub status: InstructorStatus,
    pub display_name: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub image_path: Option<String>,    // 头像
    pub schedule_path: Option<String>, // 课表图片
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Instructor {
    pub fn is_admin(&self) -> bool {
        self.role == InstructorRole::Admin
    }

    /// 生成 token 对（access + refresh）
    pub fn generate_token_pair(
        &self,
        refresh_token_expiry: Option<chrono::TimeDelta>,
    ) -> crate::errors::Result<crate::utils::jwt::TokenPair> {
        crate::utils::jwt::JwtUtils::generate_token_pair(
            self.id,
            &self.role.to_string(),
            refresh_token_expiry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("admin".parse::<InstructorRole>(), Ok(InstructorRole::Admin));
        assert_eq!(InstructorRole::Instructor.to_string(), "instructor");
        assert!("staff".parse::<InstructorRole>().is_err());
    }

    #[test]
    fn test_role_deserialize_error_message() {
        let err = serde_json::from_str::<InstructorRole>(r#""root""#).unwrap_err();
        assert!(err.to_string().contains("无效的教师角色"));
    }
}
