use async_trait::async_trait;

use super::{FaceMatch, FaceMatcher};
use crate::errors::{AttendanceError, Result};

/// 未启用人脸服务时的实现，所有调用都报告服务不可用
pub struct DisabledFaceMatcher;

fn unavailable() -> AttendanceError {
    AttendanceError::external_service("Face recognition service is not enabled")
}

#[async_trait]
impl FaceMatcher for DisabledFaceMatcher {
    async fn ensure_collection(&self) -> Result<()> {
        Err(unavailable())
    }

    async fn search(&self, _image: &[u8]) -> Result<Option<FaceMatch>> {
        Err(unavailable())
    }

    async fn enroll(&self, _image: &[u8], _external_id: &str) -> Result<String> {
        Err(unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_call_is_unavailable() {
        let matcher = DisabledFaceMatcher;
        assert!(matches!(
            matcher.search(b"img").await,
            Err(AttendanceError::ExternalService(_))
        ));
        assert!(matcher.enroll(b"img", "123").await.is_err());
        assert!(matcher.ensure_collection().await.is_err());
    }
}
