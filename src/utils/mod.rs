pub mod extractor;
pub mod file_magic;
pub mod image_store;
pub mod jwt;
pub mod multipart;
pub mod parameter_error_handler;
pub mod password;
pub mod roster;
pub mod sql;
pub mod tabular;
pub mod validate;

pub use extractor::{
    SafeCourseIdI64, SafeIDI64, SafeStudentIdI64, SafeUniversityId,
};
pub use file_magic::{detect_image_extension, validate_magic_bytes};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;
