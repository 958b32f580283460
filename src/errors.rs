//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_attendance_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum AttendanceError {
            $($variant(String),)*
        }

        impl AttendanceError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(AttendanceError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(AttendanceError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl AttendanceError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        AttendanceError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_attendance_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    DatabaseConfig("E002", "Database Configuration Error"),
    DatabaseConnection("E003", "Database Connection Error"),
    DatabaseOperation("E004", "Database Operation Error"),
    FileOperation("E005", "File Operation Error"),
    Validation("E006", "Validation Error"),
    NotFound("E007", "Resource Not Found"),
    Authentication("E008", "Authentication Error"),
    ExternalService("E009", "External Service Error"),
}

impl AttendanceError {
    /// 是否为“资源不存在”类错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AttendanceError::NotFound(_))
    }
}

impl fmt::Display for AttendanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error_type(), self.message())
    }
}

impl std::error::Error for AttendanceError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for AttendanceError {
    fn from(err: sea_orm::DbErr) -> Self {
        AttendanceError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for AttendanceError {
    fn from(err: std::io::Error) -> Self {
        AttendanceError::FileOperation(err.to_string())
    }
}

impl From<reqwest::Error> for AttendanceError {
    fn from(err: reqwest::Error) -> Self {
        AttendanceError::ExternalService(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttendanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AttendanceError::cache_connection("test").code(), "E001");
        assert_eq!(AttendanceError::database_operation("test").code(), "E004");
        assert_eq!(AttendanceError::validation("test").code(), "E006");
        assert_eq!(AttendanceError::external_service("test").code(), "E009");
    }

    #[test]
    fn test_error_message() {
        let err = AttendanceError::validation("GPA out of range");
        assert_eq!(err.message(), "GPA out of range");
        assert_eq!(err.error_type(), "Validation Error");
        assert!(!err.is_not_found());
        assert!(AttendanceError::not_found("lecture 7").is_not_found());
    }

    #[test]
    fn test_display() {
        let err = AttendanceError::external_service("face service timed out");
        assert_eq!(err.to_string(), "External Service Error: face service timed out");

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "photo missing");
        assert!(matches!(AttendanceError::from(io), AttendanceError::FileOperation(_)));
    }
}
