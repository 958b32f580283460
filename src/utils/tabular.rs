//! 上传表格（CSV / XLSX）解析
//!
//! 表头统一规范化为小写并去掉空白与下划线，例如 `Student ID` 与 `student_id`
//! 都会变成 `studentid`。

use calamine::{Reader, Xlsx};
use std::io::Cursor;

use crate::models::ErrorCode;

#[derive(Debug, Clone, PartialEq)]
pub enum TableParseError {
    MissingColumn(String),
    ParseFailed(String),
    EmptyFile,
}

impl TableParseError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingColumn(_) => ErrorCode::ImportFileMissingColumn,
            Self::ParseFailed(_) => ErrorCode::ImportFileParseFailed,
            Self::EmptyFile => ErrorCode::ImportFileDataInvalid,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::MissingColumn(col) => format!("Missing required column: {col}"),
            Self::ParseFailed(msg) => msg.clone(),
            Self::EmptyFile => "The file contains no data".to_string(),
        }
    }
}

/// 解析后的表格，单元格均已去除首尾空白
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, TableParseError> {
        self.column(name)
            .ok_or_else(|| TableParseError::MissingColumn(name.to_string()))
    }

    /// 读取单元格，缺失的列或越界的单元格视为空串
    pub fn cell<'a>(&self, row: &'a [String], column: Option<usize>) -> &'a str {
        column
            .and_then(|idx| row.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }
}

pub fn normalize_header(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn is_xlsx(file_name: &str) -> bool {
    file_name.to_lowercase().ends_with(".xlsx")
}

/// 按文件扩展名解析上传的表格，非 xlsx 一律按 CSV 处理
pub fn parse_table(data: &[u8], file_name: &str) -> Result<Table, TableParseError> {
    let (headers, rows) = if is_xlsx(file_name) {
        read_xlsx(data)?
    } else {
        read_csv(data)?
    };

    Ok(Table {
        headers: headers.iter().map(|h| normalize_header(h)).collect(),
        // 整行为空的记录直接丢弃
        rows: rows
            .into_iter()
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect(),
    })
}

fn read_csv(data: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), TableParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(data));

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| TableParseError::ParseFailed(format!("Failed to read header row: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(TableParseError::EmptyFile);
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| {
            TableParseError::ParseFailed(format!("Failed to parse row {}: {e}", idx + 1))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok((headers, rows))
}

fn read_xlsx(data: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>), TableParseError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(data))
        .map_err(|e| TableParseError::ParseFailed(format!("Failed to open XLSX: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| TableParseError::ParseFailed("Workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| TableParseError::ParseFailed(format!("Failed to read sheet: {e}")))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .ok_or(TableParseError::EmptyFile)?
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let rows = rows_iter
        .map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect()
        })
        .collect();

    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Student ID"), "studentid");
        assert_eq!(normalize_header(" course_codes "), "coursecodes");
        assert_eq!(normalize_header("GPA"), "gpa");
    }

    #[test]
    fn test_parse_csv_table() {
        let data = b"Student ID,Student Name,GPA\n 123 , Ali ,3.5\n,,\n456,Sara\n";
        let table = parse_table(data, "students.csv").unwrap();

        assert_eq!(table.headers, vec!["studentid", "studentname", "gpa"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0], vec!["123", "Ali", "3.5"]);

        let gpa = table.column("gpa");
        assert_eq!(table.cell(&table.rows[1], gpa), "");
        assert_eq!(table.cell(&table.rows[0], table.column("missing")), "");
    }

    #[test]
    fn test_required_column() {
        let table = parse_table(b"name\nAli\n", "a.csv").unwrap();
        assert_eq!(
            table.require_column("studentid"),
            Err(TableParseError::MissingColumn("studentid".to_string()))
        );
    }

    #[test]
    fn test_xlsx_round_trip() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Student_ID").unwrap();
        sheet.write_string(0, 1, "Student Name").unwrap();
        sheet.write_number(1, 0, 123.0).unwrap();
        sheet.write_string(1, 1, "Ali").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = parse_table(&bytes, "Upload.XLSX").unwrap();
        assert_eq!(table.headers, vec!["studentid", "studentname"]);
        assert_eq!(table.rows, vec![vec!["123".to_string(), "Ali".to_string()]]);
    }

    #[test]
    fn test_empty_and_broken_files() {
        assert_eq!(parse_table(b"", "a.csv").unwrap_err(), TableParseError::EmptyFile);
        assert!(matches!(
            parse_table(b"not a zip", "a.xlsx"),
            Err(TableParseError::ParseFailed(_))
        ));
    }
}
