//! 课堂存储操作

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::attendance_records::{Column as RecordColumn, Entity as AttendanceRecords};
use crate::entity::courses::{Column as CourseColumn, Entity as Courses};
use crate::entity::groups::Entity as Groups;
use crate::entity::lectures::{Column, Entity as Lectures};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::{
    PaginationInfo,
    attendance::entities::AttendanceStatus,
    lectures::{
        entities::Lecture,
        requests::LectureListQuery,
        responses::{LectureDetail, LectureListResponse, LectureRecordEntry},
    },
};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};

impl SeaOrmStorage {
    /// 分页列出课堂，按上课时间倒序
    pub async fn list_lectures_with_pagination_impl(
        &self,
        query: LectureListQuery,
    ) -> Result<LectureListResponse> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, 100);

        let mut select = Lectures::find();

        if let Some(owner_id) = query.owner_id {
            let course_ids: Vec<i64> = Courses::find()
                .select_only()
                .column(CourseColumn::Id)
                .filter(CourseColumn::OwnerId.eq(owner_id))
                .into_tuple::<i64>()
                .all(&self.db)
                .await
                .map_err(|e| AttendanceError::database_operation(format!("查询课程失败: {e}")))?;
            select = select.filter(Column::CourseId.is_in(course_ids));
        }

        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }

        if let Some(group_id) = query.group_id {
            select = select.filter(Column::GroupId.eq(group_id));
        }

        let paginator = select
            .order_by_desc(Column::DateTime)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课堂总数失败: {e}")))?;

        let lectures = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课堂列表失败: {e}")))?;

        Ok(LectureListResponse {
            items: lectures.into_iter().map(|m| m.into_lecture()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn get_lecture_by_id_impl(&self, lecture_id: i64) -> Result<Option<Lecture>> {
        let result = Lectures::find_by_id(lecture_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课堂失败: {e}")))?;

        Ok(result.map(|m| m.into_lecture()))
    }

    /// 课堂详情，考勤名单按学号排序
    pub async fn get_lecture_detail_impl(&self, lecture_id: i64) -> Result<Option<LectureDetail>> {
        let Some(lecture) = Lectures::find_by_id(lecture_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课堂失败: {e}")))?
        else {
            return Ok(None);
        };

        let course = Courses::find_by_id(lecture.course_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课程失败: {e}")))?
            .ok_or_else(|| {
                AttendanceError::not_found(format!("课程 {} 不存在", lecture.course_id))
            })?;

        let group_name = Groups::find_by_id(lecture.group_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组失败: {e}")))?
            .map(|g| g.name)
            .unwrap_or_default();

        let records = AttendanceRecords::find()
            .filter(RecordColumn::LectureId.eq(lecture_id))
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询考勤记录失败: {e}")))?;

        let student_ids: Vec<i64> = records.iter().map(|r| r.student_id).collect();
        let students: HashMap<i64, _> = if student_ids.is_empty() {
            HashMap::new()
        } else {
            Students::find()
                .filter(StudentColumn::Id.is_in(student_ids))
                .all(&self.db)
                .await
                .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?
                .into_iter()
                .map(|s| (s.id, s))
                .collect()
        };

        let mut entries: Vec<LectureRecordEntry> = records
            .into_iter()
            .filter_map(|r| {
                students.get(&r.student_id).map(|s| LectureRecordEntry {
                    student_id: s.id,
                    university_id: s.university_id.clone(),
                    student_name: s.name.clone(),
                    status: r
                        .status
                        .parse::<AttendanceStatus>()
                        .unwrap_or(AttendanceStatus::Absent),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.university_id.cmp(&b.university_id));

        Ok(Some(LectureDetail {
            lecture: lecture.into_lecture(),
            course_code: course.code,
            course_name: course.name,
            group_name,
            owner_id: course.owner_id,
            records: entries,
        }))
    }

    /// 给定课程中最近的一节课堂
    pub async fn latest_lecture_impl(&self, course_ids: &[i64]) -> Result<Option<Lecture>> {
        if course_ids.is_empty() {
            return Ok(None);
        }

        let result = Lectures::find()
            .filter(Column::CourseId.is_in(course_ids.to_vec()))
            .order_by_desc(Column::DateTime)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询课堂失败: {e}")))?;

        Ok(result.map(|m| m.into_lecture()))
    }

    /// 各课程的课堂数量，没有课堂的课程不出现在结果中
    pub async fn count_lectures_by_course_impl(
        &self,
        course_ids: &[i64],
    ) -> Result<HashMap<i64, i64>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let lecture_courses: Vec<i64> = Lectures::find()
            .select_only()
            .column(Column::CourseId)
            .filter(Column::CourseId.is_in(course_ids.to_vec()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("统计课堂数量失败: {e}")))?;

        let mut counts = HashMap::new();
        for course_id in lecture_courses {
            *counts.entry(course_id).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::super::{SeaOrmStorage, test_support};
    use crate::models::lectures::requests::LectureListQuery;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_lecture_detail_and_listing() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["200", "100"]).await;
        let present = HashSet::from(["200".to_string()]);
        let now = Utc::now();

        let older = storage
            .record_attendance_impl(fx.group.id, &present, "Week 1", now - Duration::days(7))
            .await
            .unwrap();
        let newer = storage
            .record_attendance_impl(fx.group.id, &present, "Week 2", now)
            .await
            .unwrap();

        let detail = storage
            .get_lecture_detail_impl(older.lecture_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.course_code, "CS101");
        assert_eq!(detail.group_name, "G1");
        assert_eq!(detail.owner_id, fx.owner_id);
        let ids: Vec<_> = detail.records.iter().map(|r| r.university_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "200"]);

        let list = storage
            .list_lectures_with_pagination_impl(LectureListQuery {
                page: 1,
                size: 10,
                owner_id: Some(fx.owner_id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[0].id, newer.lecture_id);

        let other_owner = test_support::instructor(&storage, "someone").await;
        let hidden = storage
            .list_lectures_with_pagination_impl(LectureListQuery {
                page: 1,
                size: 10,
                owner_id: Some(other_owner),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(hidden.items.is_empty());

        let latest = storage.latest_lecture_impl(&[fx.course.id]).await.unwrap().unwrap();
        assert_eq!(latest.id, newer.lecture_id);
        let counts = storage.count_lectures_by_course_impl(&[fx.course.id]).await.unwrap();
        assert_eq!(counts.get(&fx.course.id), Some(&2));

        assert!(storage.get_lecture_detail_impl(9999).await.unwrap().is_none());
    }
}
