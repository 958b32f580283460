//! multipart 上传读取

use actix_multipart::Multipart;
use futures_util::StreamExt;
use std::collections::HashMap;

use crate::models::ErrorCode;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadError {
    Read(String),
    TooLarge(usize),
    MultipleFiles,
    MissingFile,
}

impl UploadError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Read(_) | Self::MissingFile => ErrorCode::FileUploadFailed,
            Self::TooLarge(_) => ErrorCode::FileSizeExceeded,
            Self::MultipleFiles => ErrorCode::MultifileUploadNotAllowed,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Read(msg) => msg.clone(),
            Self::TooLarge(max) => format!("File exceeds the {max} byte limit"),
            Self::MultipleFiles => "Only one file may be uploaded".to_string(),
            Self::MissingFile => "No file was uploaded".to_string(),
        }
    }
}

/// 表单中的文件及其余文本字段
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 小写扩展名，带点号
    pub fn extension(&self) -> String {
        self.file_name
            .rfind('.')
            .map(|idx| self.file_name[idx..].to_lowercase())
            .unwrap_or_default()
    }
}

/// 读取名为 `file` 的文件字段，超过 `max_size` 字节即中止
pub async fn read_upload_form(
    payload: &mut Multipart,
    max_size: usize,
) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();
    let mut file_seen = false;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| UploadError::Read(format!("Failed to read form field: {e}")))?;
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            if file_seen {
                return Err(UploadError::MultipleFiles);
            }
            file_seen = true;
            if let Some(content_disposition) = field.content_disposition() {
                form.file_name = content_disposition
                    .get_filename()
                    .unwrap_or("upload")
                    .to_string();
            }
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| UploadError::Read(format!("Failed to read file data: {e}")))?;
                if form.file_bytes.len() + data.len() > max_size {
                    return Err(UploadError::TooLarge(max_size));
                }
                form.file_bytes.extend_from_slice(&data);
            }
        } else {
            let mut value = Vec::new();
            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| UploadError::Read(format!("Failed to read form field: {e}")))?;
                value.extend_from_slice(&data);
            }
            form.fields
                .insert(name, String::from_utf8_lossy(&value).into_owned());
        }
    }

    if form.file_bytes.is_empty() {
        return Err(UploadError::MissingFile);
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_accessors() {
        let mut form = UploadForm {
            file_name: "Week3.CSV".to_string(),
            ..Default::default()
        };
        form.fields.insert("topic".into(), "  Loops ".into());
        form.fields.insert("empty".into(), "   ".into());

        assert_eq!(form.extension(), ".csv");
        assert_eq!(form.field("topic"), Some("Loops"));
        assert_eq!(form.field("empty"), None);
        assert_eq!(form.field("missing"), None);
    }

    #[test]
    fn test_upload_error_codes() {
        assert_eq!(UploadError::TooLarge(10).error_code(), ErrorCode::FileSizeExceeded);
        assert_eq!(
            UploadError::MultipleFiles.error_code(),
            ErrorCode::MultifileUploadNotAllowed
        );
        assert!(UploadError::TooLarge(10).message().contains("10 byte"));
    }
}
