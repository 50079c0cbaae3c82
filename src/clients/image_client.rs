//! 图像生成客户端
//!
//! 通过 OpenAI 兼容的 Images API 实现 `GeneratePort` 和 `FetchPort`。
//! API 可能返回 `url`（需要二次下载）或 `b64_json`（直接解码），
//! 两种载荷都映射到 `GeneratedImage`。重试不在这一层做，由 worker 控制。

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, ConfigError, FetchError, GenerateError};
use crate::ports::{FetchPort, GeneratePort, GeneratedImage};

/// 图像生成 API 客户端
pub struct ImageApiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    size: String,
    quality: String,
    count: u8,
}

impl ImageApiClient {
    /// 创建新的图像生成客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        if config.openai_api_key.is_empty() {
            return Err(ConfigError::MissingApiKey {
                var_name: "OPENAI_API_KEY".to_string(),
            }
            .into());
        }

        Ok(Self {
            http: reqwest::Client::new(),
            api_base: config.openai_api_base.trim_end_matches('/').to_string(),
            api_key: config.openai_api_key.clone(),
            model: config.image_model.clone(),
            size: config.image_size.clone(),
            quality: config.image_quality.clone(),
            count: config.image_count,
        })
    }

    /// 从 Images API 的响应体中提取图像载荷
    fn extract_image(&self, body: &Value) -> Result<GeneratedImage, GenerateError> {
        let first = body
            .get("data")
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first())
            .ok_or_else(|| GenerateError::EmptyResult {
                model: self.model.clone(),
            })?;

        if let Some(b64) = first.get("b64_json").and_then(|v| v.as_str()) {
            let bytes = STANDARD
                .decode(b64)
                .map_err(|e| GenerateError::InvalidPayload {
                    source: Box::new(e),
                })?;
            return Ok(GeneratedImage::Bytes(bytes));
        }

        if let Some(url) = first.get("url").and_then(|v| v.as_str()) {
            return Ok(GeneratedImage::Url(url.to_string()));
        }

        Err(GenerateError::EmptyResult {
            model: self.model.clone(),
        })
    }
}

#[async_trait]
impl GeneratePort for ImageApiClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerateError> {
        let endpoint = format!("{}/images/generations", self.api_base);
        debug!("调用生成 API，模型: {}，提示词长度: {}", self.model, prompt.len());

        let request_body = json!({
            "model": self.model,
            "prompt": prompt,
            "size": self.size,
            "quality": self.quality,
            "n": self.count,
        });

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                warn!("生成 API 请求失败: {}", e);
                GenerateError::ApiCallFailed {
                    model: self.model.clone(),
                    source: Box::new(e),
                }
            })?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| GenerateError::ApiCallFailed {
                model: self.model.clone(),
                source: Box::new(e),
            })?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string());
            return Err(GenerateError::BadResponse {
                model: self.model.clone(),
                status: Some(status.as_u16()),
                message,
            });
        }

        self.extract_image(&body)
    }
}

#[async_trait]
impl FetchPort for ImageApiClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("下载生成的图像: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::RequestFailed {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::ReadBodyFailed {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        Ok(bytes.to_vec())
    }
}
