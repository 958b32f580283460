pub(crate) mod access;
pub mod attendance;
pub mod auth;
pub mod courses;
pub mod groups;
pub mod instructors;
pub mod lectures;
pub mod reports;
pub mod students;

pub use attendance::AttendanceService;
pub use auth::AuthService;
pub use courses::CourseService;
pub use groups::GroupService;
pub use instructors::InstructorService;
pub use lectures::LectureService;
pub use reports::ReportService;
pub use students::StudentService;
