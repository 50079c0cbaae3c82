//! 流水线依赖上下文
//!
//! 协调器和 worker 需要的一切依赖都显式地装进 `PipelineContext`，
//! 不使用任何进程级单例。测试时把端口换成 mock 即可。

use crate::config::Config;
use crate::ports::{DescribePort, FetchPort, GeneratePort};
use std::sync::Arc;
use std::time::Duration;

/// 生成提示词模板
///
/// 模板是若干行文本，渲染时拼接成一段，并把替换标记换成视觉描述。
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    lines: Vec<String>,
    token: String,
}

impl PromptTemplate {
    pub fn new(lines: Vec<String>, token: impl Into<String>) -> Self {
        Self {
            lines,
            token: token.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.prompt_template.clone(),
            config.description_token.clone(),
        )
    }

    /// 把描述文本代入模板，得到最终的生成提示词
    pub fn render(&self, description: &str) -> String {
        self.lines.join("\n").replace(&self.token, description)
    }
}

/// 生成端口的重试策略
///
/// 每次尝试相互独立，重试之间等待固定间隔，不做指数退避。
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 首次失败后的额外重试次数（总尝试次数 = max_retries + 1）
    pub max_retries: u32,
    /// 重试之间的等待时长
    pub wait_between: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.max_retries,
            wait_between: Duration::from_secs(config.wait_between_retries),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// 流水线依赖上下文
///
/// 持有三个外部端口、提示词模板和重试策略，
/// 在整条链路运行期间共享（Arc 克隆给每个 worker）。
pub struct PipelineContext {
    pub describer: Arc<dyn DescribePort>,
    pub generator: Arc<dyn GeneratePort>,
    pub fetcher: Arc<dyn FetchPort>,
    pub prompt: PromptTemplate,
    pub retry: RetryPolicy,
}

impl PipelineContext {
    pub fn new(
        describer: Arc<dyn DescribePort>,
        generator: Arc<dyn GeneratePort>,
        fetcher: Arc<dyn FetchPort>,
        prompt: PromptTemplate,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            describer,
            generator,
            fetcher,
            prompt,
            retry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_render_substitutes_token() {
        let template = PromptTemplate::new(
            vec![
                "Draw this: [DESC]".to_string(),
                "Style: crayon".to_string(),
            ],
            "[DESC]",
        );

        let rendered = template.render("a small red fox");
        assert_eq!(rendered, "Draw this: a small red fox\nStyle: crayon");
    }

    #[test]
    fn test_prompt_render_without_token_is_unchanged() {
        let template = PromptTemplate::new(vec!["no placeholder here".to_string()], "[DESC]");
        assert_eq!(template.render("ignored"), "no placeholder here");
    }

    #[test]
    fn test_retry_policy_total_attempts() {
        let policy = RetryPolicy {
            max_retries: 2,
            wait_between: Duration::from_secs(0),
        };
        assert_eq!(policy.total_attempts(), 3);
    }
}
