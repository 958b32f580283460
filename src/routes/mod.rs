pub mod attendance;

pub mod auth;

pub mod courses;

pub mod groups;

pub mod instructors;

pub mod lectures;

pub mod reports;

pub mod students;

pub use attendance::configure_attendance_routes;
pub use auth::configure_auth_routes;
pub use courses::configure_course_routes;
pub use groups::configure_group_routes;
pub use instructors::configure_instructor_routes;
pub use lectures::configure_lecture_routes;
pub use reports::configure_report_routes;
pub use students::{configure_public_routes, configure_student_routes};
