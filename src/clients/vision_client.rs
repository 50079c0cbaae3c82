//! 视觉描述客户端
//!
//! 通过 OpenAI 兼容的 Chat Completion API 实现 `DescribePort`：
//! 图像以 base64 data URL 形式放进用户消息的图片内容块。
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestUserMessageArgs,
        ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, ConfigError, DescribeError};
use crate::ports::DescribePort;

/// 视觉描述客户端
pub struct VisionClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    max_tokens: u32,
    temperature: f32,
    analysis_prompt: String,
}

impl VisionClient {
    /// 创建新的视觉客户端
    ///
    /// API 密钥缺失属于致命的配置错误，在这里直接失败，
    /// 而不是等到第一次调用才暴露。
    pub fn new(config: &Config) -> AppResult<Self> {
        if config.openai_api_key.is_empty() {
            return Err(ConfigError::MissingApiKey {
                var_name: "OPENAI_API_KEY".to_string(),
            }
            .into());
        }

        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_api_base);

        Ok(Self {
            client: Client::with_config(openai_config),
            model_name: config.vision_model.clone(),
            max_tokens: config.vision_max_tokens,
            temperature: config.vision_temperature,
            analysis_prompt: config.vision_prompt.clone(),
        })
    }
}

#[async_trait]
impl DescribePort for VisionClient {
    async fn describe(&self, image_bytes: &[u8]) -> Result<String, DescribeError> {
        debug!(
            "调用视觉 API，模型: {}，图像大小: {} 字节",
            self.model_name,
            image_bytes.len()
        );

        let data_url = format!("data:image/png;base64,{}", STANDARD.encode(image_bytes));

        // 构建包含文本和图片的用户消息
        let content_parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: self.analysis_prompt.clone(),
                },
            ),
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: data_url,
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(
                content_parts,
            ))
            .build()
            .map_err(|e| DescribeError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            })?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![ChatCompletionRequestMessage::User(user_msg)])
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| DescribeError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("视觉 API 调用失败: {}", e);
            DescribeError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            }
        })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(DescribeError::EmptyDescription {
                model: self.model_name.clone(),
            });
        }

        debug!("视觉 API 调用成功，描述长度: {} 字符", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_fatal() {
        let mut config = Config::default();
        config.openai_api_key = String::new();
        assert!(VisionClient::new(&config).is_err());
    }

    /// 真实 API 连通性测试
    ///
    /// 运行方式：
    /// ```bash
    /// OPENAI_API_KEY=... cargo test test_describe_real_api -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_describe_real_api() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env().expect("从环境变量加载配置失败");
        let client = VisionClient::new(&config).expect("创建视觉客户端失败");

        // 最小的合法 PNG
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba([255, 128, 0, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();

        let result = client.describe(&buf.into_inner()).await;
        match result {
            Ok(description) => {
                println!("\n========== 视觉描述 ==========");
                println!("{}", description);
                println!("==============================\n");
                assert!(!description.is_empty());
            }
            Err(e) => panic!("视觉 API 测试失败: {}", e),
        }
    }
}
