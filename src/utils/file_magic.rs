//! 上传文件的魔术字节检查

const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const ZIP: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// 验证文件内容的魔术字节是否与扩展名匹配
///
/// `extension` 包含点号，如 ".png"。文本类格式（csv/txt）不做检查。
pub fn validate_magic_bytes(data: &[u8], extension: &str) -> bool {
    if data.is_empty() {
        return false;
    }

    match extension.to_lowercase().as_str() {
        ".png" => data.starts_with(PNG),
        ".jpg" | ".jpeg" => data.starts_with(JPEG),
        ".webp" => is_webp(data),
        // xlsx 是 ZIP 容器
        ".xlsx" => data.starts_with(ZIP),
        ".csv" | ".txt" => true,
        _ => false,
    }
}

/// 根据内容识别图片格式，返回带点号的扩展名
pub fn detect_image_extension(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(PNG) {
        Some(".png")
    } else if data.starts_with(JPEG) {
        Some(".jpg")
    } else if is_webp(data) {
        Some(".webp")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_magic() {
        assert!(validate_magic_bytes(PNG, ".png"));
        assert!(validate_magic_bytes(PNG, ".PNG"));
        assert!(!validate_magic_bytes(PNG, ".jpg"));
    }

    #[test]
    fn test_jpeg_magic() {
        let jpeg_header = [0xFF, 0xD8, 0xFF, 0xE0];
        assert!(validate_magic_bytes(&jpeg_header, ".jpg"));
        assert!(validate_magic_bytes(&jpeg_header, ".jpeg"));
        assert_eq!(detect_image_extension(&jpeg_header), Some(".jpg"));
    }

    #[test]
    fn test_spreadsheet_and_text() {
        assert!(validate_magic_bytes(&[0x50, 0x4B, 0x03, 0x04, 0x14], ".xlsx"));
        assert!(!validate_magic_bytes(b"studentid,studentname", ".xlsx"));
        assert!(validate_magic_bytes(b"studentid,studentname", ".csv"));
        assert!(validate_magic_bytes(b"123\n456", ".txt"));
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        assert!(!validate_magic_bytes(&[], ".png"));
        assert!(!validate_magic_bytes(&[0x4D, 0x5A], ".exe"));
        assert_eq!(detect_image_extension(b"GIF89a"), None);
    }
}
