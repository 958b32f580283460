//! 缺勤预警计算
//!
//! 纯函数，不访问存储。缺勤次数按 (学生, 课程) 分别统计，
//! 某门课程缺勤次数达到阈值即视为该课程预警。

use std::collections::HashMap;

use crate::models::courses::entities::Course;
use crate::models::reports::responses::{
    CourseAbsence, StudentWarningSummary, WarningCourseDetail,
};
use crate::models::students::entities::Student;

pub fn is_warned(absences: i64, threshold: i64) -> bool {
    absences >= threshold
}

/// 出勤率（百分比），课程没有课堂时为 0
pub fn attendance_percentage(total_lectures: i64, absences: i64) -> f64 {
    if total_lectures <= 0 {
        return 0.0;
    }
    let attended = (total_lectures - absences).max(0);
    attended as f64 / total_lectures as f64 * 100.0
}

/// 达到阈值的课程
pub fn warning_courses(courses: &[CourseAbsence], threshold: i64) -> Vec<WarningCourseDetail> {
    courses
        .iter()
        .filter(|c| is_warned(c.absences, threshold))
        .map(|c| WarningCourseDetail {
            course_code: c.course_code.clone(),
            course_name: c.course_name.clone(),
            absences_count: c.absences,
            threshold,
        })
        .collect()
}

pub fn warning_label(warnings: &[WarningCourseDetail]) -> String {
    match warnings {
        [] => "Safe (0)".to_string(),
        [only] => format!(
            "High Risk ({} Absences in {})",
            only.absences_count, only.course_code
        ),
        many => format!("High Risk ({} Courses)", many.len()),
    }
}

pub fn summarize(
    student: Student,
    courses: &[CourseAbsence],
    threshold: i64,
) -> StudentWarningSummary {
    let warnings = warning_courses(courses, threshold);
    StudentWarningSummary {
        label: warning_label(&warnings),
        is_under_warning: !warnings.is_empty(),
        total_absences: courses.iter().map(|c| c.absences).sum(),
        warning_courses: warnings,
        student,
    }
}

/// 按学生汇总其在册课程的缺勤，结果按学号排序
pub fn member_absences(
    courses: &[Course],
    members: &HashMap<i64, Vec<Student>>,
    counts: &HashMap<(i64, i64), i64>,
) -> Vec<(Student, Vec<CourseAbsence>)> {
    let mut by_student: HashMap<i64, (Student, Vec<CourseAbsence>)> = HashMap::new();

    for course in courses {
        let Some(students) = members.get(&course.id) else {
            continue;
        };
        for student in students {
            let entry = by_student
                .entry(student.id)
                .or_insert_with(|| (student.clone(), Vec::new()));
            entry.1.push(CourseAbsence {
                course_id: course.id,
                course_code: course.code.clone(),
                course_name: course.name.clone(),
                absences: counts.get(&(student.id, course.id)).copied().unwrap_or(0),
            });
        }
    }

    let mut result: Vec<_> = by_student.into_values().collect();
    result.sort_by(|a, b| a.0.university_id.cmp(&b.0.university_id));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absence(id: i64, code: &str, absences: i64) -> CourseAbsence {
        CourseAbsence {
            course_id: id,
            course_code: code.to_string(),
            course_name: format!("{code} name"),
            absences,
        }
    }

    fn student() -> Student {
        student_with(1, "123")
    }

    fn student_with(id: i64, university_id: &str) -> Student {
        let now = chrono::Utc::now();
        Student {
            id,
            university_id: university_id.into(),
            name: "Ali".into(),
            gpa: None,
            has_photo: false,
            face_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_threshold_boundary() {
        assert!(!is_warned(2, 3));
        assert!(is_warned(3, 3));
        assert!(is_warned(4, 3));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(attendance_percentage(0, 0), 0.0);
        assert_eq!(attendance_percentage(0, 2), 0.0);
        assert_eq!(attendance_percentage(4, 1), 75.0);
        assert_eq!(attendance_percentage(10, 0), 100.0);
    }

    #[test]
    fn test_labels() {
        let safe = summarize(student(), &[absence(1, "CS101", 2)], 3);
        assert_eq!(safe.label, "Safe (0)");
        assert!(!safe.is_under_warning);
        assert_eq!(safe.total_absences, 2);

        let one = summarize(
            student(),
            &[absence(1, "CS101", 3), absence(2, "CS102", 1)],
            3,
        );
        assert_eq!(one.label, "High Risk (3 Absences in CS101)");
        assert!(one.is_under_warning);
        assert_eq!(one.warning_courses.len(), 1);
        assert_eq!(one.warning_courses[0].threshold, 3);

        let many = summarize(
            student(),
            &[absence(1, "CS101", 3), absence(2, "CS102", 5)],
            3,
        );
        assert_eq!(many.label, "High Risk (2 Courses)");
        assert_eq!(many.total_absences, 8);
    }

    #[test]
    fn test_absences_are_per_course() {
        // 两门课各缺勤 2 次，合计 4 次也不预警
        let summary = summarize(
            student(),
            &[absence(1, "CS101", 2), absence(2, "CS102", 2)],
            3,
        );
        assert!(!summary.is_under_warning);
    }

    #[test]
    fn test_member_absences_only_enrolled_courses() {
        let now = chrono::Utc::now();
        let course = |id: i64, code: &str| Course {
            id,
            owner_id: 1,
            code: code.to_string(),
            name: format!("{code} name"),
            created_at: now,
            updated_at: now,
        };
        let courses = vec![course(10, "CS101"), course(11, "CS102")];

        let mut members = HashMap::new();
        members.insert(10, vec![student_with(2, "200"), student_with(1, "100")]);
        members.insert(11, vec![student_with(1, "100")]);

        let mut counts = HashMap::new();
        counts.insert((1, 10), 4);
        counts.insert((2, 11), 9);

        let rows = member_absences(&courses, &members, &counts);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0.university_id, "100");
        assert_eq!(rows[0].1.len(), 2);
        assert_eq!(rows[0].1[0].absences, 4);
        assert_eq!(rows[0].1[1].absences, 0);
        // 未在 CS102 注册的学生不计入该课程
        assert_eq!(rows[1].1.len(), 1);
        assert_eq!(rows[1].1[0].absences, 0);
    }
}
