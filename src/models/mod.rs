//! 数据模型定义
//!
//! 按业务领域划分：`entities` 为业务实体，`requests` 为请求体，`responses` 为响应体。

pub mod attendance;
pub mod auth;
pub mod common;
pub mod courses;
pub mod groups;
pub mod imports;
pub mod instructors;
pub mod lectures;
pub mod reports;
pub mod students;

pub use common::{ApiResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// API 业务错误码
///
/// 以整数形式写入 `ApiResponse.code`，0 表示成功。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1002,
    NotFound = 1003,
    InternalServerError = 1004,
    RateLimitExceeded = 1005,
    ValidationFailed = 1006,

    // 认证与教师账号
    AuthFailed = 2000,
    InstructorNotFound = 2001,
    InstructorAlreadyExists = 2002,
    InstructorCreationFailed = 2003,

    // 课程
    CourseNotFound = 3000,
    CourseAlreadyExists = 3001,

    // 分组
    GroupNotFound = 3100,
    GroupAlreadyExists = 3101,

    // 学生
    StudentNotFound = 3200,
    StudentAlreadyExists = 3201,
    StudentGpaInvalid = 3202,
    UniversityIdInvalid = 3203,

    // 课堂与考勤
    LectureNotFound = 3300,
    AttendanceStatusInvalid = 3301,

    // 文件上传
    FileUploadFailed = 4000,
    FileTypeNotAllowed = 4001,
    FileSizeExceeded = 4002,
    MultifileUploadNotAllowed = 4003,

    // 批量导入
    ImportFileParseFailed = 5000,
    ImportFileMissingColumn = 5001,
    ImportFileDataInvalid = 5002,
    ImportRowLimitExceeded = 5003,

    // 人脸识别
    FaceServiceUnavailable = 6000,
    FaceNotRecognized = 6001,
    FaceImageInvalid = 6002,
}

impl ErrorCode {
    /// 由存储层错误推断错误码
    pub fn from_not_found(err: &crate::errors::AttendanceError, code: ErrorCode) -> ErrorCode {
        if err.is_not_found() {
            code
        } else {
            ErrorCode::InternalServerError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AttendanceError;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::CourseNotFound as i32, 3000);
        assert_eq!(ErrorCode::FaceServiceUnavailable as i32, 6000);
    }

    #[test]
    fn test_from_not_found() {
        let missing = AttendanceError::not_found("group 3");
        assert_eq!(
            ErrorCode::from_not_found(&missing, ErrorCode::GroupNotFound),
            ErrorCode::GroupNotFound
        );
        let db = AttendanceError::database_operation("locked");
        assert_eq!(
            ErrorCode::from_not_found(&db, ErrorCode::GroupNotFound),
            ErrorCode::InternalServerError
        );
    }
}
