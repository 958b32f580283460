//! 批量导入模型
//!
//! 表格上传解析为 `ImportRow`，由存储层在单个事务内对账落库，返回 `ReconcileReport`。

use serde::Serialize;
use ts_rs::TS;

/// 一行待导入数据（已完成表头映射，未做业务校验）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
    // 表格中的行号（从 1 开始，不含表头）
    pub row_number: u64,
    pub university_id: String,
    pub name: String,
    pub group_name: Option<String>,
    pub course_codes: Vec<String>,
    // GPA 原始单元格内容
    pub gpa: Option<String>,
}

/// 课程代码的查找范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileScope {
    // 教师导入：只匹配自己的课程
    Owner(i64),
    // 管理员导入：匹配全部课程
    All,
}

#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[ts(export, export_to = "import.ts")]
pub struct ImportWarning {
    pub row: u64,
    pub message: String,
}

/// 导入对账结果
#[derive(Debug, Clone, Default, Serialize, PartialEq, TS)]
#[ts(export, export_to = "import.ts")]
pub struct ReconcileReport {
    pub rows_processed: u64,
    pub rows_skipped: u64,
    pub students_created: u64,
    pub students_updated: u64,
    pub groups_created: u64,
    pub links_created: u64,
    pub codes_skipped: u64,
    pub warnings: Vec<ImportWarning>,
}

impl ReconcileReport {
    pub fn warn(&mut self, row: u64, message: impl Into<String>) {
        self.warnings.push(ImportWarning {
            row,
            message: message.into(),
        });
    }

    pub fn skip_row(&mut self, row: u64, message: impl Into<String>) {
        self.rows_skipped += 1;
        self.warn(row, message);
    }
}
