//! 课堂考勤导出（HTML / XLSX）

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tracing::error;

use super::LectureService;
use super::get::load_lecture_detail;
use crate::models::attendance::entities::AttendanceStatus;
use crate::models::lectures::requests::{ExportFormat, ExportParams};
use crate::models::lectures::responses::LectureDetail;
use crate::services::access::current_instructor;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub async fn export_lecture(
    service: &LectureService,
    request: &HttpRequest,
    lecture_id: i64,
    params: ExportParams,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let detail = match load_lecture_detail(&storage, &instructor, lecture_id).await {
        Ok(detail) => detail,
        Err(resp) => return Ok(resp),
    };

    match params.format {
        ExportFormat::Html => Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                format!("attachment; filename=\"Attendance_{lecture_id}.html\""),
            ))
            .body(render_html(&detail))),
        ExportFormat::Xlsx => {
            let buffer = render_xlsx(&detail).map_err(|e| {
                error!("XLSX 生成失败: {}", e);
                actix_web::error::ErrorInternalServerError(format!("XLSX 生成失败: {e}"))
            })?;
            Ok(HttpResponse::Ok()
                .content_type("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"Attendance_{lecture_id}.xlsx\""),
                ))
                .body(buffer))
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn status_class(status: AttendanceStatus) -> &'static str {
    match status {
        AttendanceStatus::Present => "present",
        AttendanceStatus::Absent => "absent",
        AttendanceStatus::Late => "late",
        AttendanceStatus::Excused => "excused",
    }
}

pub fn render_html(detail: &LectureDetail) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>Attendance Report</title>
<style>
body { font-family: sans-serif; padding: 20px; }
h2 { text-align: center; color: #333; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 10px; text-align: left; }
th { background-color: #f4f4f4; }
.present { color: green; font-weight: bold; }
.absent { color: red; font-weight: bold; }
.late, .excused { color: #b8860b; font-weight: bold; }
</style>
</head>
<body>
<h2>Attendance Report</h2>
"#,
    );

    html.push_str(&format!(
        "<p><strong>Course:</strong> {} ({})</p>\n",
        escape_html(&detail.course_name),
        escape_html(&detail.course_code)
    ));
    html.push_str(&format!(
        "<p><strong>Lecture:</strong> {}</p>\n",
        escape_html(&detail.lecture.topic)
    ));
    html.push_str(&format!(
        "<p><strong>Date:</strong> {}</p>\n",
        detail.lecture.date_time.format(DATE_FORMAT)
    ));
    html.push_str(&format!(
        "<p><strong>Group:</strong> {}</p>\n",
        escape_html(&detail.group_name)
    ));

    html.push_str("<table>\n<thead><tr><th>Student Name</th><th>ID</th><th>Status</th></tr></thead>\n<tbody>\n");
    for record in &detail.records {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"{}\">{}</td></tr>\n",
            escape_html(&record.student_name),
            escape_html(&record.university_id),
            status_class(record.status),
            record.status.label()
        ));
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");

    html
}

pub fn render_xlsx(detail: &LectureDetail) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Attendance")?;

    let bold = Format::new().set_bold();

    // 课堂信息
    let header_rows = [
        ("Course", format!("{} ({})", detail.course_name, detail.course_code)),
        ("Lecture", detail.lecture.topic.clone()),
        ("Date", detail.lecture.date_time.format(DATE_FORMAT).to_string()),
        ("Group", detail.group_name.clone()),
    ];
    for (row, (label, value)) in header_rows.iter().enumerate() {
        worksheet.write_string_with_format(row as u32, 0, *label, &bold)?;
        worksheet.write_string(row as u32, 1, value)?;
    }

    // 考勤名单
    let first = header_rows.len() as u32 + 1;
    for (col, title) in ["Student Name", "ID", "Status"].iter().enumerate() {
        worksheet.write_string_with_format(first, col as u16, *title, &bold)?;
    }
    for (idx, record) in detail.records.iter().enumerate() {
        let row = first + 1 + idx as u32;
        worksheet.write_string(row, 0, &record.student_name)?;
        worksheet.write_string(row, 1, &record.university_id)?;
        worksheet.write_string(row, 2, record.status.label())?;
    }
    worksheet.set_column_width(0, 28)?;
    worksheet.set_column_width(1, 16)?;

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lectures::entities::Lecture;
    use crate::models::lectures::responses::LectureRecordEntry;
    use crate::utils::tabular::parse_table;
    use chrono::TimeZone;

    fn detail() -> LectureDetail {
        let at = chrono::Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        LectureDetail {
            lecture: Lecture {
                id: 7,
                course_id: 1,
                group_id: 2,
                date_time: at,
                topic: "Pointers & <Refs>".into(),
                created_at: at,
            },
            course_code: "CS101".into(),
            course_name: "Intro".into(),
            group_name: "G1".into(),
            owner_id: 1,
            records: vec![
                LectureRecordEntry {
                    student_id: 1,
                    university_id: "100".into(),
                    student_name: "Ali".into(),
                    status: AttendanceStatus::Present,
                },
                LectureRecordEntry {
                    student_id: 2,
                    university_id: "200".into(),
                    student_name: "Bea".into(),
                    status: AttendanceStatus::Excused,
                },
            ],
        }
    }

    #[test]
    fn test_html_contains_header_and_records() {
        let html = render_html(&detail());
        assert!(html.contains("Intro (CS101)"));
        assert!(html.contains("Pointers &amp; &lt;Refs&gt;"));
        assert!(html.contains("2025-03-01 09:30"));
        assert!(html.contains("<strong>Group:</strong> G1"));
        assert!(html.contains(r#"<td class="present">Present</td>"#));
        assert!(html.contains(r#"<td class="excused">Excused</td>"#));
    }

    #[test]
    fn test_xlsx_lists_every_record() {
        let buffer = render_xlsx(&detail()).unwrap();
        // 表头之后依次是课堂信息、空行与名单
        let table = parse_table(&buffer, "export.xlsx").unwrap();
        let statuses: Vec<&str> = table
            .rows
            .iter()
            .filter_map(|row| row.get(2).map(String::as_str))
            .collect();
        assert!(statuses.contains(&"Present"));
        assert!(statuses.contains(&"Excused"));
    }
}
