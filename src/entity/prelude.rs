//! 预导入模块，方便使用

pub use super::attendance_records::{
    ActiveModel as AttendanceRecordActiveModel, Entity as AttendanceRecords,
    Model as AttendanceRecordModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::group_students::{
    ActiveModel as GroupStudentActiveModel, Entity as GroupStudents, Model as GroupStudentModel,
};
pub use super::groups::{ActiveModel as GroupActiveModel, Entity as Groups, Model as GroupModel};
pub use super::instructors::{
    ActiveModel as InstructorActiveModel, Entity as Instructors, Model as InstructorModel,
};
pub use super::lectures::{
    ActiveModel as LectureActiveModel, Entity as Lectures, Model as LectureModel,
};
pub use super::students::{
    ActiveModel as StudentActiveModel, Entity as Students, Model as StudentModel,
};
