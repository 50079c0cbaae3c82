//! Worker - 流程层
//!
//! 长驻的任务执行单元：从自己的队列消费 WorkItem，对每张图像执行
//! 完整流程，并为每个任务恰好发出一个 WorkResult——成功或失败，
//! 绝不静默丢弃。任何单项错误都被收敛为失败结果，worker 本身不崩溃。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult, GenerateError};
use crate::models::{WorkItem, WorkResult, WorkerId};
use crate::ports::GeneratedImage;
use crate::services::{naming, persistence};
use crate::utils::logging;
use crate::workflow::context::PipelineContext;
use crate::workflow::shutdown::ShutdownFlag;

/// 队列的有界等待间隔，保证关闭标志能被及时看到
const QUEUE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// 任务执行单元
pub struct Worker {
    id: WorkerId,
    iteration: u32,
    ctx: Arc<PipelineContext>,
}

impl Worker {
    pub fn new(id: WorkerId, iteration: u32, ctx: Arc<PipelineContext>) -> Self {
        Self { id, iteration, ctx }
    }

    /// 消费队列直到收到毒丸（None）、队列关闭或关闭标志置位
    pub async fn run(
        self,
        mut queue: UnboundedReceiver<Option<WorkItem>>,
        results: UnboundedSender<WorkResult>,
        shutdown: ShutdownFlag,
    ) {
        info!("🚀 {} 启动 (迭代 {})", self.id, self.iteration);

        loop {
            if shutdown.is_requested() {
                break;
            }

            match timeout(QUEUE_POLL_INTERVAL, queue.recv()).await {
                Ok(Some(Some(item))) => {
                    let result = self.process_item(&item).await;
                    // 协调器已退出时没有继续处理的意义
                    if results.send(result).is_err() {
                        break;
                    }
                }
                // 毒丸：正常停止
                Ok(Some(None)) => break,
                // 队列已关闭
                Ok(None) => break,
                // 超时：回头检查关闭标志
                Err(_) => continue,
            }
        }

        info!("🏁 {} 退出 (迭代 {})", self.id, self.iteration);
    }

    /// 处理单个任务，把所有错误收敛成失败结果
    async fn process_item(&self, item: &WorkItem) -> WorkResult {
        match self.execute_pipeline(item).await {
            Ok(output_path) => WorkResult {
                source_path: item.source_path.clone(),
                relative_path: item.relative_path.clone(),
                sequence_number: item.sequence_number,
                succeeded: true,
                detail: output_path.display().to_string(),
            },
            Err(e) => {
                error!(
                    "❌ [{}] 处理失败 {} (#{}): {}",
                    self.id.label(),
                    item.relative_path.display(),
                    item.sequence_number,
                    e
                );
                WorkResult {
                    source_path: item.source_path.clone(),
                    relative_path: item.relative_path.clone(),
                    sequence_number: item.sequence_number,
                    succeeded: false,
                    detail: e.to_string(),
                }
            }
        }
    }

    /// 单张图像的完整流程
    async fn execute_pipeline(&self, item: &WorkItem) -> AppResult<PathBuf> {
        // 步骤 1: 读取源图像
        let image_bytes = tokio::fs::read(&item.source_path)
            .await
            .map_err(|e| AppError::file_read_failed(item.source_path.display().to_string(), e))?;

        info!(
            "🔍 [{}] 开始分析 {} (#{})",
            self.id.label(),
            item.relative_path.display(),
            item.sequence_number
        );

        // 步骤 2: 视觉描述（描述失败不重试）
        let description = self
            .ctx
            .describer
            .describe(&image_bytes)
            .await
            .map_err(AppError::Describe)?;

        info!(
            "✅ [{}] 分析完成 {} (描述 {} 字符)",
            self.id.label(),
            item.relative_path.display(),
            description.len()
        );
        debug!(
            "[{}] 描述内容: {}",
            self.id.label(),
            logging::truncate_text(&description, 120)
        );

        // 步骤 3: 渲染生成提示词
        let prompt = self.ctx.prompt.render(&description);

        // 步骤 4: 图像生成（带重试）
        info!(
            "🎨 [{}] 开始生成 {}",
            self.id.label(),
            item.relative_path.display()
        );
        let generated = self.generate_with_retry(&prompt).await?;

        // 步骤 5: 拿到图像字节（URL 载荷需要二次下载）
        let output_bytes = match generated {
            GeneratedImage::Bytes(bytes) => bytes,
            GeneratedImage::Url(url) => self
                .ctx
                .fetcher
                .fetch(&url)
                .await
                .map_err(AppError::Fetch)?,
        };

        // 步骤 6: 落盘 + 校验（校验失败删除残留文件，不再重试）
        let output_path = item
            .output_directory
            .join(naming::output_file_name(&item.source_path, self.iteration));
        persistence::save_and_verify(&output_bytes, &output_path).await?;

        info!(
            "✅ [{}] 完整流程成功: {}",
            self.id.label(),
            output_path.display()
        );
        Ok(output_path)
    }

    /// 调用生成端口，失败后最多再重试 max_retries 次，重试间固定等待
    async fn generate_with_retry(&self, prompt: &str) -> AppResult<GeneratedImage> {
        let total_attempts = self.ctx.retry.total_attempts();
        let mut last_err: Option<GenerateError> = None;

        for attempt in 1..=total_attempts {
            debug!("[{}] 生成尝试 {}/{}", self.id.label(), attempt, total_attempts);

            match self.ctx.generator.generate(prompt).await {
                Ok(image) => return Ok(image),
                Err(e) => {
                    warn!(
                        "[{}] 生成失败 (尝试 {}/{}): {}",
                        self.id.label(),
                        attempt,
                        total_attempts,
                        e
                    );
                    last_err = Some(e);
                    if attempt < total_attempts {
                        sleep(self.ctx.retry.wait_between).await;
                    }
                }
            }
        }

        Err(last_err
            .map(AppError::Generate)
            .unwrap_or_else(|| AppError::Other("生成失败且没有错误详情".to_string())))
    }
}
