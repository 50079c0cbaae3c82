//! # Loop Image Pipeline
//!
//! 一个用"描述 → 再创作"循环迭代图像的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 端口与客户端层（Ports / Clients）
//! - `ports/` - 三个异步 trait，描述对外部世界的全部依赖
//! - `clients/VisionClient` - 视觉描述能力（chat completions + 图像输入）
//! - `clients/ImageApiClient` - 图像生成与 URL 下载能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 纯粹的单项能力，不关心并发
//! - `naming` - 剥离历史后缀的输出命名（`{clean}_L{iter}.png`）
//! - `discovery` - 非递归、排序稳定的图像文件发现
//! - `persistence` - 落盘 + 解码校验，坏文件即删
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一张图像"的完整处理流程
//! - `PipelineContext` - 显式注入的依赖上下文
//! - `Worker` - 长驻执行单元：消费队列直到毒丸或关闭
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/iteration` - 单轮协调：奇偶路由、错峰启动、结果排空
//! - `orchestrator/chain_runner` - 跨迭代链接：上一轮输出 = 下一轮输入
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod ports;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{ChainSummary, IterationOutcome, WorkItem, WorkResult, WorkerId};
pub use orchestrator::{App, ChainRunner, ChainSettings};
pub use ports::{DescribePort, FetchPort, GeneratePort, GeneratedImage};
pub use workflow::{PipelineContext, PromptTemplate, RetryPolicy, ShutdownFlag, Worker};
