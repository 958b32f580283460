//! 批量导入对账
//!
//! 一批表格行在单个事务内落库：按学号创建或更新学生，按课程代码找到课程，
//! 按名称找到或创建分组并建立成员关系。行级问题只记录警告并跳过，
//! 数据库错误使整个事务回滚。

use std::collections::HashMap;

use super::SeaOrmStorage;
use crate::entity::courses::{Column as CourseColumn, Entity as Courses, Model as CourseModel};
use crate::entity::group_students::{
    ActiveModel as LinkActiveModel, Column as LinkColumn, Entity as GroupStudents,
};
use crate::entity::groups::{ActiveModel as GroupActiveModel, Column as GroupColumn, Entity as Groups};
use crate::entity::students::{ActiveModel as StudentActiveModel, Column as StudentColumn, Entity as Students};
use crate::errors::{AttendanceError, Result};
use crate::models::imports::{ImportRow, ReconcileReport, ReconcileScope};
use crate::utils::validate::{
    is_blank_cell, parse_gpa_cell, validate_group_name, validate_student_name,
    validate_university_id,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

/// 通过行级校验后的学生数据
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidRow {
    pub university_id: String,
    pub name: String,
    pub gpa: Option<f64>,
    pub group_name: Option<String>,
}

/// 行级校验：学号缺失或不合规、姓名或分组名超长、GPA 非法时返回跳过原因
pub(crate) fn validate_row(row: &ImportRow) -> std::result::Result<ValidRow, String> {
    let university_id = row.university_id.trim();
    if is_blank_cell(university_id) {
        return Err("missing student id".to_string());
    }
    validate_university_id(university_id).map_err(|e| format!("student id '{university_id}': {e}"))?;

    let gpa = parse_gpa_cell(row.gpa.as_deref())?;
    let name = if is_blank_cell(&row.name) {
        String::new()
    } else {
        let name = row.name.trim();
        validate_student_name(name).map_err(str::to_string)?;
        name.to_string()
    };

    let group_name = match row.group_name.as_deref().map(str::trim) {
        Some(group) if !is_blank_cell(group) => {
            validate_group_name(group).map_err(str::to_string)?;
            Some(group.to_string())
        }
        _ => None,
    };

    Ok(ValidRow {
        university_id: university_id.to_string(),
        name,
        gpa,
        group_name,
    })
}

fn db_err(action: &str) -> impl Fn(sea_orm::DbErr) -> AttendanceError + '_ {
    move |e| AttendanceError::database_operation(format!("{action}: {e}"))
}

/// 事务内的对账状态，缓存已查到的分组
struct Reconciler<'a> {
    txn: &'a DatabaseTransaction,
    now: i64,
    report: ReconcileReport,
    groups: HashMap<(i64, String), i64>,
}

impl<'a> Reconciler<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self {
            txn,
            now: chrono::Utc::now().timestamp(),
            report: ReconcileReport::default(),
            groups: HashMap::new(),
        }
    }

    fn finish(self) -> ReconcileReport {
        self.report
    }

    /// 按学号创建或更新学生，返回学生ID；无法创建时跳过该行
    async fn upsert_student(&mut self, row_number: u64, row: &ValidRow) -> Result<Option<i64>> {
        let existing = Students::find()
            .filter(StudentColumn::UniversityId.eq(row.university_id.as_str()))
            .one(self.txn)
            .await
            .map_err(db_err("查询学生失败"))?;

        let Some(existing) = existing else {
            if row.name.is_empty() {
                self.report
                    .skip_row(row_number, format!("student {} has no name", row.university_id));
                return Ok(None);
            }

            let created = StudentActiveModel {
                university_id: Set(row.university_id.clone()),
                name: Set(row.name.clone()),
                gpa: Set(row.gpa),
                image_path: Set(None),
                face_id: Set(None),
                created_at: Set(self.now),
                updated_at: Set(self.now),
                ..Default::default()
            }
            .insert(self.txn)
            .await
            .map_err(db_err("创建学生失败"))?;

            self.report.students_created += 1;
            return Ok(Some(created.id));
        };

        let student_id = existing.id;
        // 空姓名不覆盖已有姓名，缺失的 GPA 不清空已有 GPA
        let rename = !row.name.is_empty() && row.name != existing.name;
        let regrade = row.gpa.is_some() && row.gpa != existing.gpa;

        if rename || regrade {
            let mut model: StudentActiveModel = existing.into();
            if rename {
                model.name = Set(row.name.clone());
            }
            if regrade {
                model.gpa = Set(row.gpa);
            }
            model.updated_at = Set(self.now);
            model.update(self.txn).await.map_err(db_err("更新学生失败"))?;
            self.report.students_updated += 1;
        }

        Ok(Some(student_id))
    }

    /// 在课程下按名称找到或创建分组（不区分大小写）
    async fn find_or_create_group(&mut self, course_id: i64, name: &str) -> Result<i64> {
        let key = (course_id, name.to_lowercase());
        if let Some(id) = self.groups.get(&key) {
            return Ok(*id);
        }

        let existing = Groups::find()
            .filter(GroupColumn::CourseId.eq(course_id))
            .all(self.txn)
            .await
            .map_err(db_err("查询分组失败"))?
            .into_iter()
            .find(|g| g.name.to_lowercase() == key.1);

        let group_id = match existing {
            Some(group) => group.id,
            None => {
                let created = GroupActiveModel {
                    course_id: Set(course_id),
                    name: Set(name.to_string()),
                    created_at: Set(self.now),
                    ..Default::default()
                }
                .insert(self.txn)
                .await
                .map_err(db_err("创建分组失败"))?;
                self.report.groups_created += 1;
                created.id
            }
        };

        self.groups.insert(key, group_id);
        Ok(group_id)
    }

    /// 建立成员关系，已存在时不重复创建
    async fn link(&mut self, group_id: i64, student_id: i64) -> Result<()> {
        let existing = GroupStudents::find()
            .filter(
                Condition::all()
                    .add(LinkColumn::GroupId.eq(group_id))
                    .add(LinkColumn::StudentId.eq(student_id)),
            )
            .one(self.txn)
            .await
            .map_err(db_err("查询分组成员失败"))?;

        if existing.is_none() {
            LinkActiveModel {
                group_id: Set(group_id),
                student_id: Set(student_id),
                joined_at: Set(self.now),
                ..Default::default()
            }
            .insert(self.txn)
            .await
            .map_err(db_err("加入分组失败"))?;
            self.report.links_created += 1;
        }

        Ok(())
    }
}

/// 按小写课程代码索引课程
fn index_courses(courses: Vec<CourseModel>) -> HashMap<String, Vec<CourseModel>> {
    let mut index: HashMap<String, Vec<CourseModel>> = HashMap::new();
    for course in courses {
        index
            .entry(course.code.trim().to_lowercase())
            .or_default()
            .push(course);
    }
    index
}

impl SeaOrmStorage {
    /// 批量导入学生、分组与课程关联
    pub async fn reconcile_students_impl(
        &self,
        scope: ReconcileScope,
        rows: Vec<ImportRow>,
    ) -> Result<ReconcileReport> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        let mut select = Courses::find();
        if let ReconcileScope::Owner(owner_id) = scope {
            select = select.filter(CourseColumn::OwnerId.eq(owner_id));
        }
        let courses = index_courses(select.all(&txn).await.map_err(db_err("查询课程失败"))?);

        let mut reconciler = Reconciler::new(&txn);
        for row in &rows {
            reconciler.report.rows_processed += 1;

            let valid = match validate_row(row) {
                Ok(valid) => valid,
                Err(reason) => {
                    reconciler.report.skip_row(row.row_number, reason);
                    continue;
                }
            };

            let Some(student_id) = reconciler.upsert_student(row.row_number, &valid).await? else {
                continue;
            };

            let codes: Vec<&str> = row
                .course_codes
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .collect();
            let Some(group_name) = valid.group_name.as_deref() else {
                if !codes.is_empty() {
                    reconciler
                        .report
                        .warn(row.row_number, "course codes given without a group name");
                }
                continue;
            };

            for code in codes {
                let course = match courses.get(&code.to_lowercase()).map(Vec::as_slice) {
                    Some([course]) => course,
                    Some(matches) if matches.len() > 1 => {
                        reconciler.report.codes_skipped += 1;
                        reconciler.report.warn(
                            row.row_number,
                            format!("course code {code} is ambiguous ({} courses)", matches.len()),
                        );
                        continue;
                    }
                    _ => {
                        reconciler.report.codes_skipped += 1;
                        reconciler
                            .report
                            .warn(row.row_number, format!("course code {code} not found"));
                        continue;
                    }
                };

                let group_id = reconciler.find_or_create_group(course.id, group_name).await?;
                reconciler.link(group_id, student_id).await?;
            }
        }

        let report = reconciler.finish();
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(report)
    }

    /// 向指定分组导入学生，每一行都加入该分组
    pub async fn reconcile_group_students_impl(
        &self,
        group_id: i64,
        rows: Vec<ImportRow>,
    ) -> Result<ReconcileReport> {
        let txn = self.db.begin().await.map_err(db_err("开启事务失败"))?;

        if Groups::find_by_id(group_id)
            .one(&txn)
            .await
            .map_err(db_err("查询分组失败"))?
            .is_none()
        {
            return Err(AttendanceError::not_found(format!("分组 {group_id} 不存在")));
        }

        let mut reconciler = Reconciler::new(&txn);
        for row in &rows {
            reconciler.report.rows_processed += 1;

            let valid = match validate_row(row) {
                Ok(valid) if valid.name.is_empty() => {
                    reconciler
                        .report
                        .skip_row(row.row_number, format!("student {} has no name", valid.university_id));
                    continue;
                }
                Ok(valid) => valid,
                Err(reason) => {
                    reconciler.report.skip_row(row.row_number, reason);
                    continue;
                }
            };

            if let Some(student_id) = reconciler.upsert_student(row.row_number, &valid).await? {
                reconciler.link(group_id, student_id).await?;
            }
        }

        let report = reconciler.finish();
        txn.commit().await.map_err(db_err("提交事务失败"))?;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::{SeaOrmStorage, test_support};
    use super::*;

    fn row(n: u64, id: &str, name: &str, group: Option<&str>, codes: &str, gpa: Option<&str>) -> ImportRow {
        ImportRow {
            row_number: n,
            university_id: id.to_string(),
            name: name.to_string(),
            group_name: group.map(str::to_string),
            course_codes: codes
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            gpa: gpa.map(str::to_string),
        }
    }

    #[test]
    fn test_validate_row_rules() {
        assert!(validate_row(&row(1, "", "Ali", None, "", None)).is_err());
        assert!(validate_row(&row(1, "nan", "Ali", None, "", None)).is_err());
        assert!(validate_row(&row(1, "123", "Ali", None, "", Some("7"))).is_err());

        let valid = validate_row(&row(1, " 123 ", " Ali ", None, "", Some("3.5"))).unwrap();
        assert_eq!(valid.university_id, "123");
        assert_eq!(valid.name, "Ali");
        assert_eq!(valid.gpa, Some(3.5));

        let unnamed = validate_row(&row(1, "123", "nan", None, "", None)).unwrap();
        assert!(unnamed.name.is_empty());
        assert_eq!(unnamed.group_name, None);

        let long_id = "x".repeat(40);
        for bad_id in ["12 34", "A/B", long_id.as_str()] {
            assert!(validate_row(&row(1, bad_id, "Ali", None, "", None)).is_err(), "{bad_id}");
        }
        assert!(validate_row(&row(1, "123", &"n".repeat(151), None, "", None)).is_err());
        assert!(validate_row(&row(1, "123", "Ali", Some("g".repeat(51).as_str()), "", None)).is_err());

        let grouped = validate_row(&row(1, "123", "Ali", Some(" G1 "), "", None)).unwrap();
        assert_eq!(grouped.group_name.as_deref(), Some("G1"));
    }

    #[tokio::test]
    async fn test_import_skips_missing_course_code() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();

        let report = storage
            .reconcile_students_impl(
                ReconcileScope::Owner(owner),
                vec![row(1, "123", "Ali", Some("G1"), "CS101,CS102", None)],
            )
            .await
            .unwrap();

        assert_eq!(report.rows_processed, 1);
        assert_eq!(report.students_created, 1);
        assert_eq!(report.groups_created, 1);
        assert_eq!(report.links_created, 1);
        assert_eq!(report.codes_skipped, 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].message.contains("CS102"));
    }

    #[tokio::test]
    async fn test_import_twice_creates_no_duplicates() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        let rows = vec![
            row(1, "123", "Ali", Some("G1"), "cs101", Some("3.0")),
            row(2, "456", "Bea", Some("g1"), "CS101", None),
        ];

        let first = storage
            .reconcile_students_impl(ReconcileScope::Owner(owner), rows.clone())
            .await
            .unwrap();
        assert_eq!(first.students_created, 2);
        assert_eq!(first.groups_created, 1);
        assert_eq!(first.links_created, 2);

        let second = storage
            .reconcile_students_impl(ReconcileScope::Owner(owner), rows)
            .await
            .unwrap();
        assert_eq!(second.students_created, 0);
        assert_eq!(second.students_updated, 0);
        assert_eq!(second.groups_created, 0);
        assert_eq!(second.links_created, 0);

        let groups = storage.list_groups_by_course_impl(course.id).await.unwrap();
        assert_eq!(groups.len(), 1);
        let members = storage.list_group_students_impl(groups[0].id).await.unwrap();
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn test_update_only_changed_fields() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let existing = test_support::student(&storage, "123", "Ali").await;
        storage
            .update_student_impl(
                existing.id,
                crate::models::students::requests::UpdateStudentRequest {
                    name: None,
                    gpa: Some(3.1),
                },
            )
            .await
            .unwrap();

        let report = storage
            .reconcile_students_impl(
                ReconcileScope::All,
                vec![
                    // 空姓名、缺失 GPA 不改动已有数据
                    row(1, "123", "", None, "", None),
                    row(2, "123", "Ali Hassan", None, "", None),
                ],
            )
            .await
            .unwrap();
        assert_eq!(report.students_updated, 1);
        assert_eq!(report.rows_skipped, 0);

        let reloaded = storage.get_student_by_id_impl(existing.id).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "Ali Hassan");
        assert_eq!(reloaded.gpa, Some(3.1));
    }

    #[tokio::test]
    async fn test_invalid_rows_are_skipped_not_fatal() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let report = storage
            .reconcile_students_impl(
                ReconcileScope::All,
                vec![
                    row(1, "nan", "Ghost", None, "", None),
                    row(2, "777", "Bad Gpa", None, "", Some("9.9")),
                    row(3, "888", "", None, "", None),
                    row(4, "999", "Valid", None, "", Some("4")),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.rows_processed, 4);
        assert_eq!(report.rows_skipped, 3);
        assert_eq!(report.students_created, 1);
        assert_eq!(report.warnings.len(), 3);
        assert!(storage.get_student_by_university_id_impl("777").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_ids_and_long_names_are_skipped() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        let long_id = "x".repeat(40);

        let report = storage
            .reconcile_students_impl(
                ReconcileScope::All,
                vec![
                    row(1, "12 34", "Spaced", None, "", None),
                    row(2, "A/B", "Slashed", None, "", None),
                    row(3, &long_id, "Long Id", None, "", None),
                    row(4, "321", &"n".repeat(151), None, "", None),
                    row(5, "654", "Long Group", Some("g".repeat(51).as_str()), "CS101", None),
                    row(6, "987", "Kept", Some("G1"), "CS101", None),
                ],
            )
            .await
            .unwrap();

        assert_eq!(report.rows_processed, 6);
        assert_eq!(report.rows_skipped, 5);
        assert_eq!(report.students_created, 1);
        assert_eq!(report.links_created, 1);
        assert_eq!(report.warnings.len(), 5);
        for id in ["12 34", "A/B", long_id.as_str(), "321", "654"] {
            assert!(storage.get_student_by_university_id_impl(id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_admin_scope_skips_ambiguous_codes() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let ana = test_support::instructor(&storage, "ana").await;
        let bo = test_support::instructor(&storage, "bo").await;
        storage.create_course_impl(ana, "CS101", "Intro").await.unwrap();
        storage.create_course_impl(bo, "cs101", "Intro (B)").await.unwrap();
        storage.create_course_impl(bo, "MA201", "Algebra").await.unwrap();

        let report = storage
            .reconcile_students_impl(
                ReconcileScope::All,
                vec![row(1, "123", "Ali", Some("G1"), "CS101,MA201", None)],
            )
            .await
            .unwrap();
        assert_eq!(report.codes_skipped, 1);
        assert_eq!(report.links_created, 1);

        // 教师范围内代码唯一
        let scoped = storage
            .reconcile_students_impl(
                ReconcileScope::Owner(ana),
                vec![row(1, "123", "Ali", Some("G1"), "CS101", None)],
            )
            .await
            .unwrap();
        assert_eq!(scoped.codes_skipped, 0);
        assert_eq!(scoped.links_created, 1);
    }

    #[tokio::test]
    async fn test_group_upload_links_every_row() {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let owner = test_support::instructor(&storage, "ana").await;
        let course = storage.create_course_impl(owner, "CS101", "Intro").await.unwrap();
        let group = storage.create_group_impl(course.id, "G1").await.unwrap();

        let report = storage
            .reconcile_group_students_impl(
                group.id,
                vec![
                    row(1, "123", "Ali", None, "", Some("3.2")),
                    row(2, "456", "", None, "", None),
                    row(3, "789", "Cem", None, "", None),
                ],
            )
            .await
            .unwrap();
        assert_eq!(report.students_created, 2);
        assert_eq!(report.links_created, 2);
        assert_eq!(report.rows_skipped, 1);

        let members = storage.list_group_students_impl(group.id).await.unwrap();
        assert_eq!(members.len(), 2);

        let missing = storage
            .reconcile_group_students_impl(9999, vec![])
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }
}
