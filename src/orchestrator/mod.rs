//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责跨迭代调度和单轮协调，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `chain_runner` - 链式运行器
//! - 管理应用生命周期（初始化、运行、中断）
//! - 计算每轮的输入/输出目录（上一轮输出 = 下一轮输入）
//! - 迭代之间暂停节流
//! - 输出全局统计信息
//!
//! ### `iteration` - 迭代协调器
//! - 发现一轮的输入图像并分配序号
//! - 奇偶路由到恰好两个 worker，错峰启动
//! - 排空共享结果队列，投递毒丸，有界等待退出
//! - 输出单轮统计信息
//!
//! ## 层次关系
//!
//! ```text
//! chain_runner (跨迭代，目录链接)
//!     ↓
//! iteration (单轮，两个 worker 的协调)
//!     ↓
//! workflow::Worker (处理单个 WorkItem)
//!     ↓
//! services (能力层：naming / discovery / persistence)
//!     ↓
//! ports → clients (外部 API：视觉描述 / 图像生成 / 下载)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：chain_runner 管链条，iteration 管单轮
//! 2. **显式依赖**：所有外部能力经 PipelineContext 注入，无全局状态
//! 3. **向下依赖**：编排层 → workflow → services / ports
//! 4. **无业务逻辑**：只做调度和统计，不碰图像字节

pub mod chain_runner;
pub mod iteration;

// 重新导出主要类型
pub use chain_runner::{App, ChainRunner, ChainSettings};
pub use iteration::run_iteration;
