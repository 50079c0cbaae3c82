//! 数据模型层
//!
//! 定义流水线中流转的所有数据类型：
//! - `WorkItem` / `WorkResult` - 单张图像的任务与结果
//! - `WorkerId` - 确定性的 worker 分配
//! - `IterationOutcome` / `ChainSummary` - 迭代与链路的统计

pub mod work;

pub use work::{ChainSummary, IterationOutcome, WorkItem, WorkResult, WorkerId};
