//! 工具模块
//!
//! - `logging` - 日志初始化与格式化辅助

pub mod logging;
