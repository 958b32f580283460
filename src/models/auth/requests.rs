use serde::Deserialize;
use ts_rs::TS;

// 教师登录请求
#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct LoginRequest {
    /// 用户名或邮箱
    pub username: String,
    pub password: String,
    /// 是否记住我
    #[serde(default)]
    pub remember_me: bool,
}
