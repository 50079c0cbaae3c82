//! 流程层（Workflow）
//!
//! 定义"一张图像"的完整处理流程：
//! 读取 → 视觉描述 → 提示词渲染 → 图像生成（带重试）→ 落盘校验
//!
//! - `context` - 显式构造的依赖上下文（端口、重试策略、提示词模板）
//! - `worker` - 长驻的任务执行单元，从队列消费 WorkItem
//! - `shutdown` - 协作式关闭标志

pub mod context;
pub mod shutdown;
pub mod worker;

pub use context::{PipelineContext, PromptTemplate, RetryPolicy};
pub use shutdown::ShutdownFlag;
pub use worker::Worker;
