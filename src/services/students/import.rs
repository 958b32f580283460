//! 学生批量导入
//!
//! 上传的 CSV / XLSX 先映射为 `ImportRow`，再交给存储层在一个事务内对账。
//! 分组导入（`/groups/{id}/students/import`）复用同一套读取与映射逻辑。

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::StudentService;
use crate::config::AppConfig;
use crate::models::imports::{ImportRow, ReconcileScope};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error};
use crate::utils::multipart::read_upload_form;
use crate::utils::tabular::{Table, TableParseError, parse_table};
use crate::utils::validate::is_blank_cell;
use crate::utils::validate_magic_bytes;

const IMPORT_EXTENSIONS: [&str; 2] = [".csv", ".xlsx"];

/// 表格的列布局
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowLayout {
    // studentid, studentname, [groupname], [coursecodes], [gpa]
    Bulk,
    // studentid, studentname, [gpa]，分组由路径指定
    Group,
}

/// 将表格映射为导入行，缺少必需列时报错
pub(crate) fn rows_from_table(
    table: &Table,
    layout: RowLayout,
) -> Result<Vec<ImportRow>, TableParseError> {
    let id_col = table.require_column("studentid")?;
    let name_col = table.require_column("studentname")?;
    let gpa_col = table.column("gpa");
    let (group_col, codes_col) = match layout {
        RowLayout::Bulk => (table.column("groupname"), table.column("coursecodes")),
        RowLayout::Group => (None, None),
    };

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let group_name = table.cell(row, group_col);
            let gpa = table.cell(row, gpa_col);
            ImportRow {
                row_number: idx as u64 + 1,
                university_id: table.cell(row, Some(id_col)).to_string(),
                name: table.cell(row, Some(name_col)).to_string(),
                group_name: (!is_blank_cell(group_name)).then(|| group_name.to_string()),
                course_codes: table
                    .cell(row, codes_col)
                    .split(',')
                    .map(str::trim)
                    .filter(|code| !is_blank_cell(code))
                    .map(str::to_string)
                    .collect(),
                gpa: (!gpa.is_empty()).then(|| gpa.to_string()),
            }
        })
        .collect();

    Ok(rows)
}

fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

/// 读取上传的表格并映射为导入行
pub(crate) async fn read_import_rows(
    payload: &mut Multipart,
    layout: RowLayout,
) -> Result<Vec<ImportRow>, HttpResponse> {
    let config = AppConfig::get();

    let form = read_upload_form(payload, config.import.max_file_size)
        .await
        .map_err(|e| bad_request(e.error_code(), e.message()))?;

    let extension = form.extension();
    if !IMPORT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only .csv and .xlsx files can be imported",
        ));
    }
    if !validate_magic_bytes(&form.file_bytes, &extension) {
        return Err(bad_request(
            ErrorCode::FileTypeNotAllowed,
            "File content does not match its extension",
        ));
    }

    let rows = parse_table(&form.file_bytes, &form.file_name)
        .and_then(|table| rows_from_table(&table, layout))
        .map_err(|e| bad_request(e.error_code(), e.message()))?;

    if rows.is_empty() {
        return Err(bad_request(
            ErrorCode::ImportFileDataInvalid,
            "The file contains no data rows",
        ));
    }
    if rows.len() > config.import.max_rows {
        return Err(bad_request(
            ErrorCode::ImportRowLimitExceeded,
            format!("At most {} rows can be imported at once", config.import.max_rows),
        ));
    }

    Ok(rows)
}

pub async fn import_students(
    service: &StudentService,
    request: &HttpRequest,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let rows = match read_import_rows(&mut payload, RowLayout::Bulk).await {
        Ok(rows) => rows,
        Err(resp) => return Ok(resp),
    };

    // 管理员可匹配任意教师的课程
    let scope = if instructor.is_admin() {
        ReconcileScope::All
    } else {
        ReconcileScope::Owner(instructor.id)
    };

    match storage.reconcile_students(scope, rows).await {
        Ok(report) => {
            info!(
                "Student import by instructor {}: {} rows, {} created, {} updated, {} links, {} codes skipped",
                instructor.id,
                report.rows_processed,
                report.students_created,
                report.students_updated,
                report.links_created,
                report.codes_skipped
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Import completed")))
        }
        Err(e) => Ok(internal_error("Student import failed", &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_bulk_rows_split_course_codes() {
        let t = table(
            &["studentid", "studentname", "groupname", "coursecodes", "gpa"],
            &[
                &["123", "Ali", "G1", "CS101, CS102,", "3.5"],
                &["124", "Mona", "", "", ""],
            ],
        );
        let rows = rows_from_table(&t, RowLayout::Bulk).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 1);
        assert_eq!(rows[0].group_name.as_deref(), Some("G1"));
        assert_eq!(rows[0].course_codes, vec!["CS101", "CS102"]);
        assert_eq!(rows[0].gpa.as_deref(), Some("3.5"));
        assert_eq!(rows[1].group_name, None);
        assert!(rows[1].course_codes.is_empty());
        assert_eq!(rows[1].gpa, None);
    }

    #[test]
    fn test_group_layout_ignores_group_columns() {
        let t = table(
            &["studentid", "studentname", "groupname", "coursecodes"],
            &[&["7", "Sara", "G9", "MA201"]],
        );
        let rows = rows_from_table(&t, RowLayout::Group).unwrap();

        assert_eq!(rows[0].university_id, "7");
        assert_eq!(rows[0].group_name, None);
        assert!(rows[0].course_codes.is_empty());
    }

    #[test]
    fn test_short_rows_and_missing_columns() {
        let t = table(&["studentid", "studentname", "gpa"], &[&["9"]]);
        let rows = rows_from_table(&t, RowLayout::Bulk).unwrap();
        assert_eq!(rows[0].name, "");
        assert_eq!(rows[0].gpa, None);

        let missing = table(&["studentid", "name"], &[]);
        assert_eq!(
            rows_from_table(&missing, RowLayout::Bulk).unwrap_err(),
            TableParseError::MissingColumn("studentname".to_string())
        );
    }
}
