//! 上传图片的校验、落盘与替换
//!
//! 学生照片和教师头像/课表共用这套逻辑，文件统一存放在
//! `{upload.dir}/{subdir}/{uuid}{ext}`。

use std::fs;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

use super::validate_magic_bytes;
use crate::errors::{AttendanceError, Result};

/// 检查扩展名白名单和文件头，失败时返回给客户端的提示
pub fn check_image(
    bytes: &[u8],
    extension: &str,
    allowed_types: &[String],
) -> std::result::Result<(), &'static str> {
    if !allowed_types.iter().any(|t| t.to_lowercase() == extension) {
        return Err("File type not allowed");
    }
    if !validate_magic_bytes(bytes, extension) {
        return Err("File content does not match its extension");
    }
    Ok(())
}

/// 写入新文件并返回存储路径
pub fn store_image(root: &str, subdir: &str, extension: &str, bytes: &[u8]) -> Result<String> {
    let dir = Path::new(root).join(subdir);
    fs::create_dir_all(&dir).map_err(|e| {
        AttendanceError::file_operation(format!("Failed to create upload directory: {e}"))
    })?;

    let path = dir
        .join(format!("{}{}", Uuid::new_v4(), extension))
        .to_string_lossy()
        .into_owned();
    fs::write(&path, bytes)
        .map_err(|e| AttendanceError::file_operation(format!("Failed to store image: {e}")))?;
    Ok(path)
}

/// 删除被替换掉的旧文件，失败只记日志
pub fn discard_replaced(previous: Option<String>, current: &str) {
    if let Some(previous) = previous.filter(|p| p != current)
        && let Err(e) = fs::remove_file(&previous)
    {
        warn!("Failed to remove replaced image {}: {}", previous, e);
    }
}

/// 数据库登记失败时回滚刚写入的文件
pub fn discard_stored(path: &str) {
    let _ = fs::remove_file(path);
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    fn allowed() -> Vec<String> {
        vec![".png".to_string(), ".jpg".to_string()]
    }

    fn scratch_root(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("attendance-image-store-{}-{}", name, Uuid::new_v4()))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_check_image() {
        assert!(check_image(PNG_HEADER, ".png", &allowed()).is_ok());
        assert_eq!(
            check_image(PNG_HEADER, ".gif", &allowed()),
            Err("File type not allowed")
        );
        assert_eq!(
            check_image(b"plain text", ".jpg", &allowed()),
            Err("File content does not match its extension")
        );
    }

    #[test]
    fn test_replacement_removes_previous_file() {
        let root = scratch_root("replace");

        let first = store_image(&root, "avatars", ".png", PNG_HEADER).unwrap();
        assert!(first.ends_with(".png"));
        assert!(Path::new(&first).starts_with(Path::new(&root).join("avatars")));

        let second = store_image(&root, "avatars", ".png", PNG_HEADER).unwrap();
        assert_ne!(first, second);
        assert_eq!(fs::read(&second).unwrap(), PNG_HEADER);

        discard_replaced(Some(first.clone()), &second);
        assert!(!Path::new(&first).exists());
        assert!(Path::new(&second).exists());

        // 新旧路径相同时不能误删
        discard_replaced(Some(second.clone()), &second);
        assert!(Path::new(&second).exists());

        discard_stored(&second);
        assert!(!Path::new(&second).exists());

        let _ = fs::remove_dir_all(&root);
    }
}
