//! 外部能力端口
//!
//! 流水线核心依赖但不实现的两种外部能力（加上按需的下载能力）。
//! 端口以 trait 对象形式注入 `PipelineContext`，便于测试时替换为 mock。

use crate::error::{DescribeError, FetchError, GenerateError};
use async_trait::async_trait;

/// 生成端口返回的图像载荷
///
/// API 可能直接返回图像字节（b64_json），也可能返回一个待下载的 URL。
#[derive(Debug, Clone)]
pub enum GeneratedImage {
    Bytes(Vec<u8>),
    Url(String),
}

/// 图像描述能力：给定图像字节，返回文字描述
#[async_trait]
pub trait DescribePort: Send + Sync {
    async fn describe(&self, image_bytes: &[u8]) -> Result<String, DescribeError>;
}

/// 图像生成能力：给定提示词，返回图像字节或可下载的引用
///
/// 端口本身不做重试，重试由 worker 控制。
#[async_trait]
pub trait GeneratePort: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerateError>;
}

/// 图像下载能力：仅当生成端口返回 URL 时使用
#[async_trait]
pub trait FetchPort: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}
