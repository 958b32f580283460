//! 点名名单文件解析
//!
//! CSV 取第一个表头包含 `id` 的列；其他文件按每行一个学号处理。

use std::collections::HashSet;
use std::io::Cursor;

use super::tabular::TableParseError;

pub fn parse_roster(data: &[u8], file_name: &str) -> Result<HashSet<String>, TableParseError> {
    if file_name.to_lowercase().ends_with(".csv") {
        parse_csv_roster(data)
    } else {
        let text = std::str::from_utf8(data)
            .map_err(|e| TableParseError::ParseFailed(format!("Roster is not UTF-8 text: {e}")))?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

fn parse_csv_roster(data: &[u8]) -> Result<HashSet<String>, TableParseError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(Cursor::new(data));

    let id_col = rdr
        .headers()
        .map_err(|e| TableParseError::ParseFailed(format!("Failed to read header row: {e}")))?
        .iter()
        .position(|h| h.to_lowercase().contains("id"))
        .ok_or_else(|| TableParseError::MissingColumn("id".to_string()))?;

    let mut ids = HashSet::new();
    for result in rdr.records() {
        let record =
            result.map_err(|e| TableParseError::ParseFailed(format!("Failed to parse row: {e}")))?;
        if let Some(id) = record.get(id_col).filter(|id| !id.is_empty()) {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_uses_first_id_column() {
        let data = b"Name,Student ID,Group ID\nAli,123,G1\nSara,,G1\nOmar, 456 ,G2\n";
        let ids = parse_roster(data, "Roster.CSV").unwrap();
        assert_eq!(ids, HashSet::from(["123".to_string(), "456".to_string()]));
    }

    #[test]
    fn test_csv_without_id_column() {
        assert_eq!(
            parse_roster(b"name\nAli\n", "roster.csv").unwrap_err(),
            TableParseError::MissingColumn("id".to_string())
        );
    }

    #[test]
    fn test_text_roster_ignores_blank_lines() {
        let ids = parse_roster(b"123\n\n  456  \r\n123\n", "roster.txt").unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("456"));
    }
}
