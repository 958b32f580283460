use base64::{Engine, engine::general_purpose::STANDARD};

use crate::errors::{AttendanceError, Result};
use crate::utils::detect_image_extension;

/// 解码前端拍摄的图片
///
/// 接受 `data:image/png;base64,...` 形式的 data URL 或裸 base64，
/// 解码结果必须是 PNG / JPEG / WebP。
pub fn decode_image(input: &str) -> Result<Vec<u8>> {
    let input = input.trim();
    let payload = match input.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest
                .split_once(',')
                .ok_or_else(|| AttendanceError::validation("Malformed data URL"))?;
            if !meta.ends_with(";base64") {
                return Err(AttendanceError::validation("Data URL must be base64 encoded"));
            }
            data
        }
        None => input,
    };

    if payload.is_empty() {
        return Err(AttendanceError::validation("Image data is empty"));
    }

    // 部分客户端会在 base64 中插入换行
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| AttendanceError::validation(format!("Invalid base64 image: {e}")))?;

    if detect_image_extension(&bytes).is_none() {
        return Err(AttendanceError::validation("Unsupported image format"));
    }
    Ok(bytes)
}

pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_decode_data_url_and_raw() {
        let encoded = encode_image(&PNG_HEADER);
        let from_url = decode_image(&format!("data:image/png;base64,{encoded}")).unwrap();
        assert_eq!(from_url, PNG_HEADER);
        assert_eq!(decode_image(&encoded).unwrap(), PNG_HEADER);
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(decode_image("").is_err());
        assert!(decode_image("data:image/png,abc").is_err());
        assert!(decode_image("!!!not base64!!!").is_err());
        // 合法 base64 但不是图片
        assert!(decode_image(&encode_image(b"hello world")).is_err());
    }
}
