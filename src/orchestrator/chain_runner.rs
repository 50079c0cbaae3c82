//! 链式运行器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责跨迭代的目录链接和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：启动日志、构建视觉/图像客户端、装配依赖上下文
//! 2. **目录链接**：第 1 轮从源目录本身读取，之后第 k 轮从 `源目录/(k-1)` 读取，
//!    写入 `源目录/k`（上一轮的输出就是下一轮的输入）
//! 3. **迭代调度**：按 `start_loop..=end_loop` 顺序委托 `iteration::run_iteration`
//! 4. **节流**：相邻迭代之间暂停固定时长
//! 5. **协作式中断**：监听 Ctrl+C，置位关闭标志后在迭代边界停止
//! 6. **全局统计**：汇总所有迭代的处理结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单张图像的细节
//! - **空轮不中断**：某轮输入为空只记 (0, 0)，链条继续推进
//! - **向下委托**：委托 iteration 协调一轮，iteration 再委托 workflow::Worker

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::clients::{ImageApiClient, VisionClient};
use crate::config::Config;
use crate::models::ChainSummary;
use crate::orchestrator::iteration;
use crate::utils::logging;
use crate::workflow::{PipelineContext, PromptTemplate, RetryPolicy, ShutdownFlag};

/// 链式运行参数
///
/// 从 Config 中抽出链条本身关心的字段，方便测试时直接构造。
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub source_directory: PathBuf,
    pub start_loop: u32,
    pub end_loop: u32,
    pub pause_between_iterations: Duration,
    pub worker_stagger: Duration,
    pub supported_formats: Vec<String>,
}

impl ChainSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            source_directory: PathBuf::from(&config.source_directory),
            start_loop: config.start_loop,
            end_loop: config.end_loop,
            pause_between_iterations: Duration::from_secs(config.pause_between_iterations),
            worker_stagger: Duration::from_secs(config.worker_stagger_secs),
            supported_formats: config.supported_formats.clone(),
        }
    }

    /// 第 `iteration` 轮的输入目录
    ///
    /// 第 1 轮固定读源目录本身（即使 `源目录/0` 恰好存在也不读它），
    /// 之后读上一轮的输出目录。
    pub fn input_dir_for(&self, iteration: u32) -> PathBuf {
        if iteration == 1 {
            self.source_directory.clone()
        } else {
            self.source_directory.join((iteration - 1).to_string())
        }
    }

    /// 第 `iteration` 轮的输出目录
    pub fn output_dir_for(&self, iteration: u32) -> PathBuf {
        self.source_directory.join(iteration.to_string())
    }
}

/// 链式运行器
///
/// 依赖通过 `PipelineContext` 显式注入，测试时传入 mock 端口即可
/// 跑完整条链路。
pub struct ChainRunner {
    ctx: Arc<PipelineContext>,
    settings: ChainSettings,
    shutdown: ShutdownFlag,
}

impl ChainRunner {
    pub fn new(ctx: Arc<PipelineContext>, settings: ChainSettings, shutdown: ShutdownFlag) -> Self {
        Self {
            ctx,
            settings,
            shutdown,
        }
    }

    /// 按顺序执行所有迭代，返回全链统计
    pub async fn run(&self) -> Result<ChainSummary> {
        let mut summary = ChainSummary::default();

        for iteration in self.settings.start_loop..=self.settings.end_loop {
            if self.shutdown.is_requested() {
                warn!("🛑 链条在迭代 {} 开始前被中断", iteration);
                break;
            }

            let input_dir = self.settings.input_dir_for(iteration);
            let output_dir = self.settings.output_dir_for(iteration);

            logging::log_iteration_start(
                iteration,
                self.settings.end_loop,
                &input_dir,
                &output_dir,
            );

            let outcome = iteration::run_iteration(
                self.ctx.clone(),
                &input_dir,
                &output_dir,
                iteration,
                self.settings.worker_stagger,
                &self.settings.supported_formats,
                &self.shutdown,
            )
            .await?;

            summary.record(iteration, outcome);

            // 最后一轮之后没有必要再暂停
            if iteration < self.settings.end_loop && !self.shutdown.is_requested() {
                info!(
                    "⏸️ 暂停 {} 秒后进入迭代 {}...",
                    self.settings.pause_between_iterations.as_secs(),
                    iteration + 1
                );
                sleep(self.settings.pause_between_iterations).await;
            }
        }

        Ok(summary)
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    runner: ChainRunner,
    shutdown: ShutdownFlag,
}

impl App {
    /// 初始化应用：日志文件、客户端、依赖上下文
    pub fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        // 视觉描述与图像生成走同一套凭证，分别建客户端
        let vision = Arc::new(VisionClient::new(&config)?);
        let images = Arc::new(ImageApiClient::new(&config)?);

        let ctx = Arc::new(PipelineContext::new(
            vision,
            images.clone(),
            images,
            PromptTemplate::from_config(&config),
            RetryPolicy::from_config(&config),
        ));

        let shutdown = ShutdownFlag::new();
        let settings = ChainSettings::from_config(&config);
        let runner = ChainRunner::new(ctx, settings, shutdown.clone());

        Ok(Self {
            config,
            runner,
            shutdown,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        self.spawn_interrupt_watcher();

        let overall_start = Instant::now();
        let summary = self.runner.run().await?;

        logging::print_final_stats(&summary, overall_start.elapsed(), &self.config.output_log_file);

        Ok(())
    }

    /// 监听 Ctrl+C，把中断转成协作式关闭请求
    fn spawn_interrupt_watcher(&self) {
        let flag = self.shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 收到中断信号，等待当前任务收尾后退出...");
                flag.request();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ChainSettings {
        ChainSettings {
            source_directory: PathBuf::from("/data/image_loop"),
            start_loop: 1,
            end_loop: 3,
            pause_between_iterations: Duration::from_secs(0),
            worker_stagger: Duration::from_secs(0),
            supported_formats: vec![".png".to_string()],
        }
    }

    #[test]
    fn test_first_iteration_reads_source_directory_itself() {
        let s = settings();
        assert_eq!(s.input_dir_for(1), PathBuf::from("/data/image_loop"));
        assert_eq!(s.output_dir_for(1), PathBuf::from("/data/image_loop/1"));
    }

    #[test]
    fn test_later_iterations_chain_previous_output() {
        let s = settings();
        assert_eq!(s.input_dir_for(2), PathBuf::from("/data/image_loop/1"));
        assert_eq!(s.output_dir_for(2), PathBuf::from("/data/image_loop/2"));
        assert_eq!(s.input_dir_for(7), PathBuf::from("/data/image_loop/6"));
    }
}
