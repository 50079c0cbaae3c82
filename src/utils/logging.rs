/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::models::ChainSummary;

/// 初始化 tracing 订阅器
///
/// 日志级别从 `RUST_LOG` 读取，缺省为 info。
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loop_image_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 初始化运行日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回是否成功初始化
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n循环图像处理日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 双 worker 循环图像处理模式");
    info!("📂 源目录: {}", config.source_directory);
    info!(
        "🔁 迭代范围: {} - {}",
        config.start_loop, config.end_loop
    );
    info!(
        "🎨 模型: {} (视觉) / {} (生成)",
        config.vision_model, config.image_model
    );
    info!("{}", "=".repeat(60));
}

/// 记录迭代开始信息
pub fn log_iteration_start(iteration: u32, end_loop: u32, input_dir: &Path, output_dir: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("🔁 开始迭代 {}/{}", iteration, end_loop);
    info!("📥 输入目录: {}", input_dir.display());
    info!("📤 输出目录: {}", output_dir.display());
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `summary`: 全链统计
/// - `elapsed`: 总耗时
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(summary: &ChainSummary, elapsed: Duration, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部迭代完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));

    for (iteration, outcome) in &summary.per_iteration {
        info!(
            "  迭代 {}: ✅ {}/{}",
            iteration, outcome.successful, outcome.total
        );
    }

    info!("{}", "─".repeat(60));
    info!(
        "✅ 成功: {}/{}",
        summary.total_successful, summary.total_processed
    );
    info!(
        "❌ 失败: {}",
        summary.total_processed - summary.total_successful
    );
    info!("⏱️ 总耗时: {:.1} 秒", elapsed.as_secs_f64());
    if summary.total_processed > 0 {
        info!(
            "⏱️ 平均每张: {:.1} 秒",
            elapsed.as_secs_f64() / summary.total_processed as f64
        );
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_short_is_unchanged() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
    }

    #[test]
    fn test_truncate_text_long_gets_ellipsis() {
        assert_eq!(truncate_text("abcdefgh", 5), "abcde...");
    }
}
