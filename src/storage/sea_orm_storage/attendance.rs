//! 考勤记录存储操作
//!
//! 名单考勤与人脸考勤都在单个事务内完成课堂创建与考勤落库。

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::SeaOrmStorage;
use crate::entity::attendance_records::{
    ActiveModel as RecordActiveModel, Column as RecordColumn, Entity as AttendanceRecords,
};
use crate::entity::group_students::{Column as LinkColumn, Entity as GroupStudents};
use crate::entity::groups::{Entity as Groups, Model as GroupModel};
use crate::entity::lectures::{
    ActiveModel as LectureActiveModel, Column as LectureColumn, Entity as Lectures,
};
use crate::entity::students::{Column as StudentColumn, Entity as Students, Model as StudentModel};
use crate::errors::{AttendanceError, Result};
use crate::models::attendance::{
    entities::{AttendanceRecord, AttendanceStatus},
    responses::{AttendanceSummary, FaceAttendanceResult},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

fn db_err(action: &str) -> impl Fn(sea_orm::DbErr) -> AttendanceError + '_ {
    move |e| AttendanceError::database_operation(format!("{action}: {e}"))
}

/// `now` 所在 UTC 自然日的起止时间戳 [start, end)
pub(crate) fn utc_day_bounds(now: DateTime<Utc>) -> (i64, i64) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_else(|| now.timestamp());
    (start, start + 86_400)
}

async fn find_group<C: ConnectionTrait>(db: &C, group_id: i64) -> Result<GroupModel> {
    Groups::find_by_id(group_id)
        .one(db)
        .await
        .map_err(db_err("查询分组失败"))?
        .ok_or_else(|| AttendanceError::not_found(format!("分组 {group_id} 不存在")))
}

/// 分组当前的全部成员
async fn group_members<C: ConnectionTrait>(db: &C, group_id: i64) -> Result<Vec<StudentModel>> {
    let student_ids: Vec<i64> = GroupStudents::find()
        .select_only()
        .column(LinkColumn::StudentId)
        .filter(LinkColumn::GroupId.eq(group_id))
        .into_tuple::<i64>()
        .all(db)
        .await
        .map_err(db_err("查询分组成员失败"))?;

    if student_ids.is_empty() {
        return Ok(Vec::new());
    }

    Students::find()
        .filter(StudentColumn::Id.is_in(student_ids))
        .order_by_asc(StudentColumn::UniversityId)
        .all(db)
        .await
        .map_err(db_err("查询学生失败"))
}

async fn insert_lecture<C: ConnectionTrait>(
    db: &C,
    group: &GroupModel,
    topic: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    let lecture = LectureActiveModel {
        course_id: Set(group.course_id),
        group_id: Set(group.id),
        date_time: Set(now.timestamp()),
        topic: Set(topic.to_string()),
        created_at: Set(now.timestamp()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(db_err("创建课堂失败"))?;

    Ok(lecture.id)
}

async fn insert_record<C: ConnectionTrait>(
    db: &C,
    lecture_id: i64,
    student_id: i64,
    status: AttendanceStatus,
    now: i64,
) -> Result<AttendanceRecord> {
    let record = RecordActiveModel {
        lecture_id: Set(lecture_id),
        student_id: Set(student_id),
        status: Set(status.to_string()),
        recorded_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(db_err("写入考勤记录失败"))?;

    Ok(record.into_attendance_record())
}

/// 写入或更新 (课堂, 学生) 的考勤状态
async fn upsert_record<C: ConnectionTrait>(
    db: &C,
    lecture_id: i64,
    student_id: i64,
    status: AttendanceStatus,
    now: i64,
) -> Result<AttendanceRecord> {
    let existing = AttendanceRecords::find()
        .filter(
            Condition::all()
                .add(RecordColumn::LectureId.eq(lecture_id))
                .add(RecordColumn::StudentId.eq(student_id)),
        )
        .one(db)
        .await
        .map_err(db_err("查询考勤记录失败"))?;

    match existing {
        Some(existing) => {
            let mut model: RecordActiveModel = existing.into();
            model.status = Set(status.to_string());
            model.recorded_at = Set(now);
            let updated = model.update(db).await.map_err(db_err("更新考勤记录失败"))?;
            Ok(updated.into_attendance_record())
        }
        None => insert_record(db, lecture_id, student_id, status, now).await,
    }
}

impl SeaOrmStorage {
    /// 按名单文件记录一次课堂考勤
    ///
    /// 总是新建课堂，并为分组的每位成员写入一条记录：学号在 `present` 中为出勤，否则缺勤。
    pub async fn record_attendance_impl(
        &self,
        group_id: i64,
        present: &HashSet<String>,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceSummary> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let group = find_group(&txn, group_id).await?;
        let members = group_members(&txn, group_id).await?;
        let lecture_id = insert_lecture(&txn, &group, topic, now).await?;

        let mut present_count: u64 = 0;
        for student in &members {
            let status = if present.contains(&student.university_id) {
                present_count += 1;
                AttendanceStatus::Present
            } else {
                AttendanceStatus::Absent
            };
            insert_record(&txn, lecture_id, student.id, status, now.timestamp()).await?;
        }

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        let roster: HashSet<&str> = members.iter().map(|s| s.university_id.as_str()).collect();
        let mut unmatched: Vec<String> = present
            .iter()
            .filter(|id| !roster.contains(id.as_str()))
            .cloned()
            .collect();
        unmatched.sort();

        let total = members.len() as u64;
        Ok(AttendanceSummary {
            lecture_id,
            present: present_count,
            absent: total - present_count,
            total,
            unmatched,
        })
    }

    /// 人脸识别命中后记录出勤
    ///
    /// 同一分组、同一 UTC 日、同一主题共用一节课堂；首次创建时为全部成员写入缺勤，
    /// 随后把命中的学生标记为出勤。
    pub async fn record_face_attendance_impl(
        &self,
        group_id: i64,
        university_id: &str,
        topic: &str,
        now: DateTime<Utc>,
    ) -> Result<FaceAttendanceResult> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let group = find_group(&txn, group_id).await?;
        let student = Students::find()
            .filter(StudentColumn::UniversityId.eq(university_id))
            .one(&txn)
            .await
            .map_err(db_err("查询学生失败"))?
            .ok_or_else(|| AttendanceError::not_found(format!("学号 {university_id} 不存在")))?;

        let (day_start, day_end) = utc_day_bounds(now);
        let existing = Lectures::find()
            .filter(
                Condition::all()
                    .add(LectureColumn::GroupId.eq(group_id))
                    .add(LectureColumn::Topic.eq(topic))
                    .add(LectureColumn::DateTime.gte(day_start))
                    .add(LectureColumn::DateTime.lt(day_end)),
            )
            .order_by_asc(LectureColumn::DateTime)
            .one(&txn)
            .await
            .map_err(db_err("查询课堂失败"))?;

        let (lecture_id, lecture_created) = match existing {
            Some(lecture) => (lecture.id, false),
            None => {
                let lecture_id = insert_lecture(&txn, &group, topic, now).await?;
                for member in group_members(&txn, group_id).await? {
                    insert_record(
                        &txn,
                        lecture_id,
                        member.id,
                        AttendanceStatus::Absent,
                        now.timestamp(),
                    )
                    .await?;
                }
                (lecture_id, true)
            }
        };

        upsert_record(
            &txn,
            lecture_id,
            student.id,
            AttendanceStatus::Present,
            now.timestamp(),
        )
        .await?;

        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(FaceAttendanceResult {
            student_id: student.id,
            student_name: student.name,
            university_id: student.university_id,
            lecture_id,
            lecture_created,
        })
    }

    /// 修改单条考勤状态，记录不存在时创建
    pub async fn set_record_status_impl(
        &self,
        lecture_id: i64,
        student_id: i64,
        status: AttendanceStatus,
    ) -> Result<AttendanceRecord> {
        if Lectures::find_by_id(lecture_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询课堂失败"))?
            .is_none()
        {
            return Err(AttendanceError::not_found(format!("课堂 {lecture_id} 不存在")));
        }

        if Students::find_by_id(student_id)
            .one(&self.db)
            .await
            .map_err(db_err("查询学生失败"))?
            .is_none()
        {
            return Err(AttendanceError::not_found(format!("学生 {student_id} 不存在")));
        }

        upsert_record(
            &self.db,
            lecture_id,
            student_id,
            status,
            Utc::now().timestamp(),
        )
        .await
    }

    /// 某节课堂的全部考勤记录，按学生ID索引
    pub async fn list_lecture_records_impl(
        &self,
        lecture_id: i64,
    ) -> Result<HashMap<i64, AttendanceRecord>> {
        let records = AttendanceRecords::find()
            .filter(RecordColumn::LectureId.eq(lecture_id))
            .all(&self.db)
            .await
            .map_err(db_err("查询考勤记录失败"))?;

        Ok(records
            .into_iter()
            .map(|r| (r.student_id, r.into_attendance_record()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SeaOrmStorage, test_support};
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_utc_day_bounds() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 17, 45, 12).unwrap();
        let (start, end) = utc_day_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap().timestamp());
        assert_eq!(end - start, 86_400);
        assert!(now.timestamp() >= start && now.timestamp() < end);
    }

    #[tokio::test]
    async fn test_roster_marks_present_and_absent() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["100", "200", "300", "400"]).await;

        let present: HashSet<String> = ["100", "300", "999"].iter().map(|s| s.to_string()).collect();
        let summary = storage
            .record_attendance_impl(fx.group.id, &present, "Week 1", Utc::now())
            .await
            .unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.present, 2);
        assert_eq!(summary.absent, 2);
        assert_eq!(summary.unmatched, vec!["999".to_string()]);

        let records = storage.list_lecture_records_impl(summary.lecture_id).await.unwrap();
        assert_eq!(records.len(), 4);
        let present_ids: HashSet<i64> = records
            .values()
            .filter(|r| r.status == AttendanceStatus::Present)
            .map(|r| r.student_id)
            .collect();
        assert_eq!(present_ids, HashSet::from([fx.students[0].id, fx.students[2].id]));
    }

    #[tokio::test]
    async fn test_roster_upload_always_creates_lecture() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["100"]).await;
        let present = HashSet::new();

        let first = storage
            .record_attendance_impl(fx.group.id, &present, "Week 1", Utc::now())
            .await
            .unwrap();
        let second = storage
            .record_attendance_impl(fx.group.id, &present, "Week 1", Utc::now())
            .await
            .unwrap();
        assert_ne!(first.lecture_id, second.lecture_id);
        assert_eq!(second.absent, 1);
    }

    #[tokio::test]
    async fn test_face_match_creates_lecture_once_per_day() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["123", "456", "789"]).await;
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

        let first = storage
            .record_face_attendance_impl(fx.group.id, "123", "Unspecified Topic", now)
            .await
            .unwrap();
        assert!(first.lecture_created);
        assert_eq!(first.student_name, "Student 123");

        let records = storage.list_lecture_records_impl(first.lecture_id).await.unwrap();
        assert_eq!(records.len(), 3);
        let present: Vec<_> = records
            .values()
            .filter(|r| r.status == AttendanceStatus::Present)
            .collect();
        assert_eq!(present.len(), 1);
        assert_eq!(present[0].student_id, fx.students[0].id);

        // 同日同主题复用课堂
        let later = now + chrono::Duration::hours(2);
        let second = storage
            .record_face_attendance_impl(fx.group.id, "456", "Unspecified Topic", later)
            .await
            .unwrap();
        assert!(!second.lecture_created);
        assert_eq!(second.lecture_id, first.lecture_id);
        let records = storage.list_lecture_records_impl(first.lecture_id).await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records
                .values()
                .filter(|r| r.status == AttendanceStatus::Present)
                .count(),
            2
        );

        // 次日新建课堂
        let next_day = now + chrono::Duration::days(1);
        let third = storage
            .record_face_attendance_impl(fx.group.id, "123", "Unspecified Topic", next_day)
            .await
            .unwrap();
        assert!(third.lecture_created);
    }

    #[tokio::test]
    async fn test_face_match_unknown_student_mutates_nothing() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["123"]).await;

        let err = storage
            .record_face_attendance_impl(fx.group.id, "000", "Topic", Utc::now())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            storage.count_lectures_by_course_impl(&[fx.course.id]).await.unwrap().get(&fx.course.id),
            None
        );
    }

    #[tokio::test]
    async fn test_set_record_status_upserts() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["100"]).await;
        let summary = storage
            .record_attendance_impl(fx.group.id, &HashSet::new(), "Week 1", Utc::now())
            .await
            .unwrap();

        let record = storage
            .set_record_status_impl(summary.lecture_id, fx.students[0].id, AttendanceStatus::Excused)
            .await
            .unwrap();
        assert_eq!(record.status, AttendanceStatus::Excused);

        // 课堂后加入的学生
        let late_joiner = test_support::student(&storage, "555", "Late Joiner").await;
        storage
            .set_record_status_impl(summary.lecture_id, late_joiner.id, AttendanceStatus::Late)
            .await
            .unwrap();
        let records = storage.list_lecture_records_impl(summary.lecture_id).await.unwrap();
        assert_eq!(records.len(), 2);

        let missing = storage
            .set_record_status_impl(9999, fx.students[0].id, AttendanceStatus::Present)
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }
}
