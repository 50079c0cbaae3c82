//! 客户端层
//!
//! 端口的具体实现：
//! - `vision_client` - 基于 OpenAI 兼容的 Chat API 实现描述端口
//! - `image_client` - 基于 OpenAI 兼容的 Images API 实现生成与下载端口

pub mod image_client;
pub mod vision_client;

pub use image_client::ImageApiClient;
pub use vision_client::VisionClient;
