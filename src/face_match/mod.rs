//! 人脸比对服务边界
//!
//! 识别引擎本身在外部服务中，这里只定义调用接口。启动时根据配置构造
//! HTTP 客户端或禁用实现，以 `Arc<dyn FaceMatcher>` 注入应用。

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::FaceMatchConfig;
use crate::errors::Result;

pub mod client;
pub mod disabled;
pub mod image;

pub use client::HttpFaceMatcher;
pub use disabled::DisabledFaceMatcher;
pub use image::decode_image;

/// 一次搜索的最佳匹配
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatch {
    // 登记时使用的外部 ID，即学号
    pub external_id: String,
    pub similarity: f64,
}

#[async_trait]
pub trait FaceMatcher: Send + Sync {
    /// 确保人脸集合存在
    async fn ensure_collection(&self) -> Result<()>;

    /// 在集合中搜索最相似的人脸，无匹配返回 None
    async fn search(&self, image: &[u8]) -> Result<Option<FaceMatch>>;

    /// 登记人脸，返回服务端的 face id
    async fn enroll(&self, image: &[u8], external_id: &str) -> Result<String>;
}

pub fn create_face_matcher(config: &FaceMatchConfig) -> Result<Arc<dyn FaceMatcher>> {
    if !config.enabled {
        tracing::info!("Face matching is disabled");
        return Ok(Arc::new(DisabledFaceMatcher));
    }
    Ok(Arc::new(HttpFaceMatcher::new(config)?))
}
