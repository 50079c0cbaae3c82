use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;

/// 程序配置文件
///
/// 三级加载顺序：默认值 → TOML 配置文件 → 环境变量覆盖
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 循环设置 ---
    /// 源图像目录（第 1 轮迭代的输入目录）
    pub source_directory: String,
    /// 起始迭代编号（1-based）
    pub start_loop: u32,
    /// 结束迭代编号（含）
    pub end_loop: u32,
    /// 迭代之间的暂停秒数
    pub pause_between_iterations: u64,
    /// 两个 worker 的错峰启动间隔（秒）
    pub worker_stagger_secs: u64,
    // --- 视觉模型配置 ---
    pub openai_api_key: String,
    pub openai_api_base: String,
    pub vision_model: String,
    pub vision_max_tokens: u32,
    pub vision_temperature: f32,
    /// 视觉分析提示词
    pub vision_prompt: String,
    // --- 图像生成配置 ---
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
    pub image_count: u8,
    // --- 提示词模板 ---
    /// 生成提示词模板（逐行拼接，描述文本替换 description_token）
    pub prompt_template: Vec<String>,
    pub description_token: String,
    // --- 处理设置 ---
    /// 支持的图像格式（小写扩展名，含点号）
    pub supported_formats: Vec<String>,
    /// 生成失败后的额外重试次数
    pub max_retries: u32,
    /// 重试之间的等待秒数
    pub wait_between_retries: u64,
    // --- 日志 ---
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_directory: "./image_loop".to_string(),
            start_loop: 1,
            end_loop: 10,
            pause_between_iterations: 5,
            worker_stagger_secs: 3,
            openai_api_key: String::new(),
            openai_api_base: "https://api.openai.com/v1".to_string(),
            vision_model: "gpt-4o".to_string(),
            vision_max_tokens: 4096,
            vision_temperature: 0.7,
            vision_prompt: "Analyze this image and describe what you see. \
                            Focus on the main object and provide a clear, detailed description \
                            that would help create an improved version for educational content \
                            for toddlers. Be specific about colors, shapes, and characteristics."
                .to_string(),
            image_model: "dall-e-3".to_string(),
            image_size: "1024x1024".to_string(),
            image_quality: "standard".to_string(),
            image_count: 1,
            prompt_template: vec![
                "Create a colorful crayon drawing based on this description: [DESCRIPTION]"
                    .to_string(),
                "Style: Simple, friendly cartoon drawing for toddlers, as if drawn with crayons or colored pencils".to_string(),
                "Format: Single object centered on plain white background, filling about 80% of the image space".to_string(),
                "Quality: Bold, clean lines with bright, vibrant colors".to_string(),
                "Aesthetic: Child-friendly, warm, playful, and educational".to_string(),
                "Size: 1024x1024 pixels, no framing or borders".to_string(),
            ],
            description_token: "[DESCRIPTION]".to_string(),
            supported_formats: vec![".png".to_string(), ".jpg".to_string(), ".jpeg".to_string()],
            max_retries: 2,
            wait_between_retries: 2,
            output_log_file: "loop_output.txt".to_string(),
        }
    }
}

impl Config {
    /// 加载配置：先读 TOML 文件（如果存在），再应用环境变量覆盖
    pub fn load(config_path: impl AsRef<Path>) -> AppResult<Self> {
        let path = config_path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                crate::error::AppError::file_read_failed(path.display().to_string(), e)
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::FileParseFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 仅从环境变量加载（默认值兜底）
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// 应用环境变量覆盖；数值变量写错了要报错，不能静默回落默认值
    fn apply_env_overrides(&mut self) -> AppResult<()> {
        if let Ok(v) = std::env::var("SOURCE_DIRECTORY") {
            self.source_directory = v;
        }
        if let Some(v) = read_env_parsed("START_LOOP")? {
            self.start_loop = v;
        }
        if let Some(v) = read_env_parsed("END_LOOP")? {
            self.end_loop = v;
        }
        if let Some(v) = read_env_parsed("PAUSE_BETWEEN_ITERATIONS")? {
            self.pause_between_iterations = v;
        }
        if let Some(v) = read_env_parsed("WORKER_STAGGER_SECS")? {
            self.worker_stagger_secs = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_BASE") {
            self.openai_api_base = v;
        }
        if let Ok(v) = std::env::var("VISION_MODEL") {
            self.vision_model = v;
        }
        if let Ok(v) = std::env::var("IMAGE_MODEL") {
            self.image_model = v;
        }
        if let Some(v) = read_env_parsed("MAX_RETRIES")? {
            self.max_retries = v;
        }
        if let Some(v) = read_env_parsed("WAIT_BETWEEN_RETRIES")? {
            self.wait_between_retries = v;
        }
        if let Ok(v) = std::env::var("OUTPUT_LOG_FILE") {
            self.output_log_file = v;
        }
        Ok(())
    }

    /// 校验配置的内部一致性
    pub fn validate(&self) -> AppResult<()> {
        if self.start_loop < 1 || self.start_loop > self.end_loop {
            return Err(ConfigError::InvalidLoopRange {
                start: self.start_loop,
                end: self.end_loop,
            }
            .into());
        }
        Ok(())
    }
}

fn read_env_parsed<T: std::str::FromStr>(var_name: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }
            .into()),
        },
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.start_loop, 1);
        assert_eq!(config.end_loop, 10);
        assert!(config
            .prompt_template
            .iter()
            .any(|line| line.contains(&config.description_token)));
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            source_directory = "./my_images"
            start_loop = 2
            end_loop = 4
            image_model = "gpt-image-1"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.source_directory, "./my_images");
        assert_eq!(config.start_loop, 2);
        assert_eq!(config.end_loop, 4);
        assert_eq!(config.image_model, "gpt-image-1");
        // 未指定字段应保持默认值
        assert_eq!(config.vision_model, "gpt-4o");
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_malformed_numeric_env_var_is_error() {
        std::env::set_var("WAIT_BETWEEN_RETRIES", "not-a-number");
        let result = Config::from_env();
        std::env::remove_var("WAIT_BETWEEN_RETRIES");

        assert!(matches!(
            result,
            Err(crate::error::AppError::Config(
                ConfigError::EnvVarParseFailed { .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_loop_range() {
        let mut config = Config::default();
        config.start_loop = 5;
        config.end_loop = 3;
        assert!(config.validate().is_err());

        config.start_loop = 0;
        config.end_loop = 3;
        assert!(config.validate().is_err());
    }
}
