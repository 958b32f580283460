//! 报表查询：缺勤统计、课程成员、最近考勤
//!
//! 只做数据聚合，预警判定在服务层完成。

use std::collections::{BTreeMap, HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::attendance_records::{Column as RecordColumn, Entity as AttendanceRecords};
use crate::entity::courses::{Column as CourseColumn, Entity as Courses};
use crate::entity::group_students::{Column as LinkColumn, Entity as GroupStudents};
use crate::entity::groups::{Column as GroupColumn, Entity as Groups};
use crate::entity::lectures::{Column as LectureColumn, Entity as Lectures};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    attendance::entities::AttendanceStatus, reports::responses::CourseAbsence,
    students::entities::Student, students::responses::RecentAttendance,
};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

fn db_err(action: &str) -> impl Fn(sea_orm::DbErr) -> AttendanceError + '_ {
    move |e| AttendanceError::database_operation(format!("{action}: {e}"))
}

impl SeaOrmStorage {
    /// 课程ID -> 该课程各课堂ID
    async fn lecture_course_map(&self, course_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let pairs: Vec<(i64, i64)> = Lectures::find()
            .select_only()
            .column(LectureColumn::Id)
            .column(LectureColumn::CourseId)
            .filter(LectureColumn::CourseId.is_in(course_ids.to_vec()))
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(db_err("查询课堂失败"))?;

        Ok(pairs.into_iter().collect())
    }

    /// 统计 (学生ID, 课程ID) 的缺勤次数
    ///
    /// 只统计状态为 absent 的记录，迟到与请假不计入。
    pub async fn absence_counts_impl(
        &self,
        course_ids: &[i64],
        student_ids: Option<&[i64]>,
    ) -> Result<HashMap<(i64, i64), i64>> {
        let lecture_courses = self.lecture_course_map(course_ids).await?;
        if lecture_courses.is_empty() {
            return Ok(HashMap::new());
        }

        let mut condition = Condition::all()
            .add(RecordColumn::Status.eq(AttendanceStatus::ABSENT))
            .add(RecordColumn::LectureId.is_in(lecture_courses.keys().copied().collect::<Vec<_>>()));
        if let Some(student_ids) = student_ids {
            condition = condition.add(RecordColumn::StudentId.is_in(student_ids.to_vec()));
        }

        let absences: Vec<(i64, i64)> = AttendanceRecords::find()
            .select_only()
            .column(RecordColumn::StudentId)
            .column(RecordColumn::LectureId)
            .filter(condition)
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(db_err("统计缺勤失败"))?;

        let mut counts = HashMap::new();
        for (student_id, lecture_id) in absences {
            if let Some(course_id) = lecture_courses.get(&lecture_id) {
                *counts.entry((student_id, *course_id)).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    /// 每门课程的在册学生（属于该课程任一分组），按学号排序且去重
    pub async fn list_course_members_impl(
        &self,
        course_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Student>>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let group_courses: HashMap<i64, i64> = Groups::find()
            .select_only()
            .column(GroupColumn::Id)
            .column(GroupColumn::CourseId)
            .filter(GroupColumn::CourseId.is_in(course_ids.to_vec()))
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(db_err("查询分组失败"))?
            .into_iter()
            .collect();

        if group_courses.is_empty() {
            return Ok(HashMap::new());
        }

        let links: Vec<(i64, i64)> = GroupStudents::find()
            .select_only()
            .column(LinkColumn::GroupId)
            .column(LinkColumn::StudentId)
            .filter(LinkColumn::GroupId.is_in(group_courses.keys().copied().collect::<Vec<_>>()))
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(db_err("查询分组成员失败"))?;

        let student_ids: HashSet<i64> = links.iter().map(|(_, s)| *s).collect();
        if student_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let students: HashMap<i64, Student> = Students::find()
            .filter(StudentColumn::Id.is_in(student_ids.into_iter().collect::<Vec<_>>()))
            .all(&self.db)
            .await
            .map_err(db_err("查询学生失败"))?
            .into_iter()
            .map(|m| (m.id, m.into_student()))
            .collect();

        let mut members: HashMap<i64, BTreeMap<String, Student>> = HashMap::new();
        for (group_id, student_id) in links {
            if let (Some(course_id), Some(student)) =
                (group_courses.get(&group_id), students.get(&student_id))
            {
                members
                    .entry(*course_id)
                    .or_default()
                    .insert(student.university_id.clone(), student.clone());
            }
        }

        Ok(members
            .into_iter()
            .map(|(course_id, by_uid)| (course_id, by_uid.into_values().collect()))
            .collect())
    }

    /// 学生在各课程的缺勤次数
    ///
    /// 覆盖其所在分组的课程以及有考勤记录的课程，按课程代码排序。
    pub async fn student_course_absences_impl(&self, student_id: i64) -> Result<Vec<CourseAbsence>> {
        let group_ids: Vec<i64> = GroupStudents::find()
            .select_only()
            .column(LinkColumn::GroupId)
            .filter(LinkColumn::StudentId.eq(student_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(db_err("查询学生分组失败"))?;

        let mut course_ids: HashSet<i64> = if group_ids.is_empty() {
            HashSet::new()
        } else {
            Groups::find()
                .select_only()
                .column(GroupColumn::CourseId)
                .filter(GroupColumn::Id.is_in(group_ids))
                .into_tuple::<i64>()
                .all(&self.db)
                .await
                .map_err(db_err("查询分组失败"))?
                .into_iter()
                .collect()
        };

        let lecture_ids: Vec<i64> = AttendanceRecords::find()
            .select_only()
            .column(RecordColumn::LectureId)
            .filter(RecordColumn::StudentId.eq(student_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(db_err("查询考勤记录失败"))?;

        if !lecture_ids.is_empty() {
            let attended: Vec<i64> = Lectures::find()
                .select_only()
                .column(LectureColumn::CourseId)
                .filter(LectureColumn::Id.is_in(lecture_ids))
                .into_tuple::<i64>()
                .all(&self.db)
                .await
                .map_err(db_err("查询课堂失败"))?;
            course_ids.extend(attended);
        }

        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let course_ids: Vec<i64> = course_ids.into_iter().collect();
        let counts = self
            .absence_counts_impl(&course_ids, Some(&[student_id]))
            .await?;

        let courses = Courses::find()
            .filter(CourseColumn::Id.is_in(course_ids))
            .order_by_asc(CourseColumn::Code)
            .all(&self.db)
            .await
            .map_err(db_err("查询课程失败"))?;

        Ok(courses
            .into_iter()
            .map(|c| CourseAbsence {
                course_id: c.id,
                absences: counts.get(&(student_id, c.id)).copied().unwrap_or(0),
                course_code: c.code,
                course_name: c.name,
            })
            .collect())
    }

    /// 学生最近的考勤记录，按上课时间倒序，只取前 `limit` 节课堂
    pub async fn list_recent_attendance_impl(
        &self,
        student_id: i64,
        limit: u64,
    ) -> Result<Vec<RecentAttendance>> {
        let lecture_ids: Vec<i64> = AttendanceRecords::find()
            .select_only()
            .column(RecordColumn::LectureId)
            .filter(RecordColumn::StudentId.eq(student_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(db_err("查询考勤记录失败"))?;

        if lecture_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let lectures = Lectures::find()
            .filter(LectureColumn::Id.is_in(lecture_ids))
            .order_by_desc(LectureColumn::DateTime)
            .order_by_desc(LectureColumn::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err("查询课堂失败"))?;

        let statuses: HashMap<i64, String> = AttendanceRecords::find()
            .filter(
                Condition::all()
                    .add(RecordColumn::StudentId.eq(student_id))
                    .add(RecordColumn::LectureId.is_in(lectures.iter().map(|l| l.id).collect::<Vec<_>>())),
            )
            .all(&self.db)
            .await
            .map_err(db_err("查询考勤记录失败"))?
            .into_iter()
            .map(|r| (r.lecture_id, r.status))
            .collect();

        let courses: HashMap<i64, _> = Courses::find()
            .filter(CourseColumn::Id.is_in(lectures.iter().map(|l| l.course_id).collect::<Vec<_>>()))
            .all(&self.db)
            .await
            .map_err(db_err("查询课程失败"))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok(lectures
            .into_iter()
            .filter_map(|lecture| {
                let course = courses.get(&lecture.course_id)?;
                let status = statuses.get(&lecture.id)?;
                Some(RecentAttendance {
                    lecture_id: lecture.id,
                    course_code: course.code.clone(),
                    course_name: course.name.clone(),
                    date_time: chrono::DateTime::<chrono::Utc>::from_timestamp(lecture.date_time, 0)
                        .unwrap_or_default(),
                    status: status.parse().unwrap_or(AttendanceStatus::Absent),
                    topic: lecture.topic,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::super::{SeaOrmStorage, test_support};
    use crate::models::attendance::entities::AttendanceStatus;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_absence_counts_ignore_late_and_excused() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["100", "200"]).await;
        let alice = fx.students[0].id;

        let mut lecture_ids = Vec::new();
        for week in 0..4 {
            let summary = storage
                .record_attendance_impl(fx.group.id, &HashSet::new(), &format!("Week {week}"), Utc::now())
                .await
                .unwrap();
            lecture_ids.push(summary.lecture_id);
        }
        storage
            .set_record_status_impl(lecture_ids[0], alice, AttendanceStatus::Late)
            .await
            .unwrap();
        storage
            .set_record_status_impl(lecture_ids[1], alice, AttendanceStatus::Excused)
            .await
            .unwrap();

        let counts = storage.absence_counts_impl(&[fx.course.id], None).await.unwrap();
        assert_eq!(counts.get(&(alice, fx.course.id)), Some(&2));
        assert_eq!(counts.get(&(fx.students[1].id, fx.course.id)), Some(&4));

        let only_alice = storage
            .absence_counts_impl(&[fx.course.id], Some(&[alice]))
            .await
            .unwrap();
        assert_eq!(only_alice.len(), 1);
    }

    #[tokio::test]
    async fn test_course_members_are_deduplicated() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["300", "100"]).await;
        let second_group = storage.create_group_impl(fx.course.id, "G2").await.unwrap();
        storage
            .add_student_to_group_impl(second_group.id, fx.students[0].id)
            .await
            .unwrap();

        let members = storage.list_course_members_impl(&[fx.course.id]).await.unwrap();
        let ids: Vec<_> = members[&fx.course.id]
            .iter()
            .map(|s| s.university_id.as_str())
            .collect();
        assert_eq!(ids, vec!["100", "300"]);
    }

    #[tokio::test]
    async fn test_recent_attendance_newest_first_and_limited() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["100"]).await;
        let now = Utc::now();
        let present = HashSet::from(["100".to_string()]);

        for days_ago in [3, 1, 2] {
            storage
                .record_attendance_impl(
                    fx.group.id,
                    &present,
                    &format!("{days_ago} days ago"),
                    now - Duration::days(days_ago),
                )
                .await
                .unwrap();
        }

        let recent = storage
            .list_recent_attendance_impl(fx.students[0].id, 2)
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].topic, "1 days ago");
        assert_eq!(recent[1].topic, "2 days ago");
        assert_eq!(recent[0].status, AttendanceStatus::Present);

        // 其他分组的课堂不出现在该学生的记录中
        let other = storage.create_group_impl(fx.course.id, "G2").await.unwrap();
        storage
            .record_attendance_impl(other.id, &HashSet::new(), "elsewhere", now)
            .await
            .unwrap();
        let all = storage
            .list_recent_attendance_impl(fx.students[0].id, 10)
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|r| r.topic != "elsewhere"));

        assert!(storage.list_recent_attendance_impl(fx.students[0].id, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_student_course_absences_include_zero_courses() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["100"]).await;
        let other_course = storage
            .create_course_impl(fx.owner_id, "MA201", "Algebra")
            .await
            .unwrap();
        let other_group = storage.create_group_impl(other_course.id, "M1").await.unwrap();
        storage
            .add_student_to_group_impl(other_group.id, fx.students[0].id)
            .await
            .unwrap();
        storage
            .record_attendance_impl(fx.group.id, &HashSet::new(), "Week 1", Utc::now())
            .await
            .unwrap();

        let absences = storage
            .student_course_absences_impl(fx.students[0].id)
            .await
            .unwrap();
        assert_eq!(absences.len(), 2);
        assert_eq!(absences[0].course_code, "CS101");
        assert_eq!(absences[0].absences, 1);
        assert_eq!(absences[1].course_code, "MA201");
        assert_eq!(absences[1].absences, 0);
    }
}
