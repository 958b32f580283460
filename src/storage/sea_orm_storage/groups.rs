//! 分组与分组成员存储操作

use std::collections::{HashMap, HashSet};

use super::SeaOrmStorage;
use crate::entity::group_students::{
    ActiveModel as LinkActiveModel, Column as LinkColumn, Entity as GroupStudents,
};
use crate::entity::groups::{ActiveModel, Column, Entity as Groups};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::{groups::entities::Group, students::entities::Student};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

impl SeaOrmStorage {
    pub async fn create_group_impl(&self, course_id: i64, name: &str) -> Result<Group> {
        let model = ActiveModel {
            course_id: Set(course_id),
            name: Set(name.trim().to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("创建分组失败: {e}")))?;

        Ok(result.into_group())
    }

    pub async fn get_group_by_id_impl(&self, group_id: i64) -> Result<Option<Group>> {
        let result = Groups::find_by_id(group_id)
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组失败: {e}")))?;

        Ok(result.map(|m| m.into_group()))
    }

    /// 在课程下按名称查找分组（不区分大小写）
    pub async fn find_group_by_name_impl(&self, course_id: i64, name: &str) -> Result<Option<Group>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .list_groups_by_course_impl(course_id)
            .await?
            .into_iter()
            .find(|g| g.name.to_lowercase() == wanted))
    }

    pub async fn list_groups_by_course_impl(&self, course_id: i64) -> Result<Vec<Group>> {
        let groups = Groups::find()
            .filter(Column::CourseId.eq(course_id))
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组列表失败: {e}")))?;

        Ok(groups.into_iter().map(|m| m.into_group()).collect())
    }

    pub async fn update_group_impl(&self, group_id: i64, name: &str) -> Result<Option<Group>> {
        if self.get_group_by_id_impl(group_id).await?.is_none() {
            return Ok(None);
        }

        let model = ActiveModel {
            id: Set(group_id),
            name: Set(name.trim().to_string()),
            ..Default::default()
        };

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("更新分组失败: {e}")))?;

        Ok(Some(result.into_group()))
    }

    pub async fn delete_group_impl(&self, group_id: i64) -> Result<bool> {
        let result = Groups::delete_by_id(group_id)
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("删除分组失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 分组成员，按学号排序
    pub async fn list_group_students_impl(&self, group_id: i64) -> Result<Vec<Student>> {
        let student_ids: Vec<i64> = GroupStudents::find()
            .select_only()
            .column(LinkColumn::StudentId)
            .filter(LinkColumn::GroupId.eq(group_id))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组成员失败: {e}")))?;

        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let students = Students::find()
            .filter(StudentColumn::Id.is_in(student_ids))
            .order_by_asc(StudentColumn::UniversityId)
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    /// 将学生加入分组，已是成员时返回 false
    pub async fn add_student_to_group_impl(&self, group_id: i64, student_id: i64) -> Result<bool> {
        let existing = GroupStudents::find()
            .filter(
                Condition::all()
                    .add(LinkColumn::GroupId.eq(group_id))
                    .add(LinkColumn::StudentId.eq(student_id)),
            )
            .one(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组成员失败: {e}")))?;

        if existing.is_some() {
            return Ok(false);
        }

        LinkActiveModel {
            group_id: Set(group_id),
            student_id: Set(student_id),
            joined_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| AttendanceError::database_operation(format!("加入分组失败: {e}")))?;

        Ok(true)
    }

    /// 各课程的分组数量，没有分组的课程不出现在结果中
    pub async fn count_groups_by_course_impl(&self, course_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let group_courses: Vec<i64> = Groups::find()
            .select_only()
            .column(Column::CourseId)
            .filter(Column::CourseId.is_in(course_ids.to_vec()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("统计分组数量失败: {e}")))?;

        let mut counts = HashMap::new();
        for course_id in group_courses {
            *counts.entry(course_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// 各分组的成员数量
    pub async fn count_group_students_impl(&self, group_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if group_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let links: Vec<i64> = GroupStudents::find()
            .select_only()
            .column(LinkColumn::GroupId)
            .filter(LinkColumn::GroupId.is_in(group_ids.to_vec()))
            .into_tuple::<i64>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("统计分组成员失败: {e}")))?;

        let mut counts = HashMap::new();
        for group_id in links {
            *counts.entry(group_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    /// 各课程的学生人数，同一学生在多个分组中只计一次
    pub async fn count_course_students_impl(&self, course_ids: &[i64]) -> Result<HashMap<i64, i64>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let group_course: HashMap<i64, i64> = Groups::find()
            .select_only()
            .column(Column::Id)
            .column(Column::CourseId)
            .filter(Column::CourseId.is_in(course_ids.to_vec()))
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组失败: {e}")))?
            .into_iter()
            .collect();

        if group_course.is_empty() {
            return Ok(HashMap::new());
        }

        let links: Vec<(i64, i64)> = GroupStudents::find()
            .select_only()
            .column(LinkColumn::GroupId)
            .column(LinkColumn::StudentId)
            .filter(LinkColumn::GroupId.is_in(group_course.keys().copied().collect::<Vec<_>>()))
            .into_tuple::<(i64, i64)>()
            .all(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("查询分组成员失败: {e}")))?;

        let mut students: HashMap<i64, HashSet<i64>> = HashMap::new();
        for (group_id, student_id) in links {
            if let Some(course_id) = group_course.get(&group_id) {
                students.entry(*course_id).or_default().insert(student_id);
            }
        }

        Ok(students
            .into_iter()
            .map(|(course_id, ids)| (course_id, ids.len() as i64))
            .collect())
    }

    pub async fn remove_student_from_group_impl(&self, group_id: i64, student_id: i64) -> Result<bool> {
        let result = GroupStudents::delete_many()
            .filter(
                Condition::all()
                    .add(LinkColumn::GroupId.eq(group_id))
                    .add(LinkColumn::StudentId.eq(student_id)),
            )
            .exec(&self.db)
            .await
            .map_err(|e| AttendanceError::database_operation(format!("移出分组失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SeaOrmStorage, test_support};

    #[tokio::test]
    async fn test_group_membership_is_unique() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        let group = storage.create_group_impl(course.id, "G1").await.unwrap();
        let b = test_support::student(&storage, "200", "Bea").await;
        let a = test_support::student(&storage, "100", "Ali").await;

        assert!(storage.add_student_to_group_impl(group.id, b.id).await.unwrap());
        assert!(storage.add_student_to_group_impl(group.id, a.id).await.unwrap());
        assert!(!storage.add_student_to_group_impl(group.id, a.id).await.unwrap());

        let roster = storage.list_group_students_impl(group.id).await.unwrap();
        let ids: Vec<_> = roster.iter().map(|s| s.university_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "200"]);

        assert!(storage.remove_student_from_group_impl(group.id, b.id).await.unwrap());
        assert_eq!(storage.list_group_students_impl(group.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_member_counts_per_group_and_course() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        let empty = storage.create_course_impl(owner, "MA201", "Algebra").await.unwrap();
        let g1 = storage.create_group_impl(course.id, "G1").await.unwrap();
        let g2 = storage.create_group_impl(course.id, "G2").await.unwrap();
        let a = test_support::student(&storage, "100", "Ali").await;
        let b = test_support::student(&storage, "200", "Bea").await;

        storage.add_student_to_group_impl(g1.id, a.id).await.unwrap();
        storage.add_student_to_group_impl(g1.id, b.id).await.unwrap();
        storage.add_student_to_group_impl(g2.id, a.id).await.unwrap();

        let per_group = storage.count_group_students_impl(&[g1.id, g2.id]).await.unwrap();
        assert_eq!(per_group.get(&g1.id), Some(&2));
        assert_eq!(per_group.get(&g2.id), Some(&1));

        // Ali 在两个分组中，只计一次
        let per_course = storage
            .count_course_students_impl(&[course.id, empty.id])
            .await
            .unwrap();
        assert_eq!(per_course.get(&course.id), Some(&2));
        assert_eq!(per_course.get(&empty.id), None);

        let groups = storage
            .count_groups_by_course_impl(&[course.id, empty.id])
            .await
            .unwrap();
        assert_eq!(groups.get(&course.id), Some(&2));
        assert_eq!(groups.get(&empty.id), None);
    }

    #[tokio::test]
    async fn test_find_group_by_name_ignores_case() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        let group = storage.create_group_impl(course.id, "Lab A").await.unwrap();

        let found = storage
            .find_group_by_name_impl(course.id, " lab a ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, group.id);
    }
}
