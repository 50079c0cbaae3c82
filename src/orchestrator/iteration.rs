//! 迭代协调器 - 编排层
//!
//! ## 职责
//!
//! 在一轮迭代内把发现的图像分配给恰好两个 worker 并汇总结果：
//!
//! 1. **任务发现**：非递归列出输入目录中的图像，排序后分配 1-based 序号
//! 2. **确定性路由**：奇数序号 → Worker-1 队列，偶数序号 → Worker-2 队列
//! 3. **错峰启动**：Worker-1 先启动，Worker-2 延迟固定间隔再启动
//! 4. **结果排空**：阻塞消费共享结果队列，直到所有任务都有结果、
//!    两个 worker 都退出、或收到关闭请求
//! 5. **协作式收尾**：向两个队列投递毒丸，有界等待 worker 退出

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::error::FileError;
use crate::models::{IterationOutcome, WorkItem, WorkerId};
use crate::services::discovery;
use crate::workflow::{PipelineContext, ShutdownFlag, Worker};

/// 结果队列的有界等待间隔（用于周期性检查 worker 存活与关闭标志）
const RESULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// 收尾阶段等待单个 worker 退出的上限
const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// 执行一轮迭代
///
/// # 参数
/// - `ctx`: 流水线依赖上下文
/// - `input_dir`: 本轮输入目录（只读取当前层）
/// - `output_dir`: 本轮输出目录（不存在时创建）
/// - `iteration`: 1-based 迭代编号（用于输出文件命名）
/// - `stagger`: 两个 worker 的错峰启动间隔
/// - `supported_formats`: 受支持的图像扩展名
/// - `shutdown`: 协作式关闭标志
///
/// # 返回
/// 返回本轮统计。输入为空时返回 `(0, 0)` 且不启动任何 worker；
/// 被取消时 `total` 为已排空的结果数量，部分进度不会被丢弃。
pub async fn run_iteration(
    ctx: Arc<PipelineContext>,
    input_dir: &Path,
    output_dir: &Path,
    iteration: u32,
    stagger: Duration,
    supported_formats: &[String],
    shutdown: &ShutdownFlag,
) -> Result<IterationOutcome> {
    let start_time = Instant::now();

    // 输出目录按需创建
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| FileError::CreateDirFailed {
            path: output_dir.display().to_string(),
            source: Box::new(e),
        })?;

    // ========== 任务发现 ==========
    let image_files = discovery::list_image_files(input_dir, supported_formats).await?;

    if image_files.is_empty() {
        warn!(
            "[迭代 {}] ⚠️ 在 {} 中没有找到图像，跳过本轮",
            iteration,
            input_dir.display()
        );
        return Ok(IterationOutcome::default());
    }

    let total = image_files.len();
    info!("[迭代 {}] 🎯 开始处理 {} 张图像", iteration, total);
    info!("[迭代 {}]    📂 输入: {}", iteration, input_dir.display());
    info!("[迭代 {}]    📂 输出: {}", iteration, output_dir.display());

    // ========== 队列与路由 ==========
    // 每个 worker 一条输入队列（单生产者单消费者），毒丸用 None 表示；
    // 结果队列由两个 worker 共同写入，协调器独自排空。
    let (worker1_tx, worker1_rx) = mpsc::unbounded_channel::<Option<WorkItem>>();
    let (worker2_tx, worker2_rx) = mpsc::unbounded_channel::<Option<WorkItem>>();
    let (results_tx, mut results_rx) = mpsc::unbounded_channel();

    for (index, image_file) in image_files.iter().enumerate() {
        let sequence_number = index + 1;
        let relative_path = image_file
            .strip_prefix(input_dir)
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|_| image_file.clone());

        let item = WorkItem {
            source_path: image_file.clone(),
            relative_path,
            sequence_number,
            output_directory: output_dir.to_path_buf(),
        };

        // 交错分配：奇数 → Worker-1，偶数 → Worker-2
        match WorkerId::for_sequence(sequence_number) {
            WorkerId::Worker1 => {
                let _ = worker1_tx.send(Some(item));
            }
            WorkerId::Worker2 => {
                let _ = worker2_tx.send(Some(item));
            }
        }
    }

    // ========== 错峰启动两个 worker ==========
    let worker1 = Worker::new(WorkerId::Worker1, iteration, ctx.clone());
    let handle1 = tokio::spawn(worker1.run(worker1_rx, results_tx.clone(), shutdown.clone()));

    sleep(stagger).await;

    let worker2 = Worker::new(WorkerId::Worker2, iteration, ctx.clone());
    let handle2 = tokio::spawn(worker2.run(worker2_rx, results_tx.clone(), shutdown.clone()));

    // 协调器不再发送结果，释放自己的发送端，
    // 这样两个 worker 都退出后 recv() 会返回 None
    drop(results_tx);

    // ========== 排空结果 ==========
    let mut completed = 0usize;
    let mut successful = 0usize;

    while completed < total {
        if shutdown.is_requested() {
            warn!("[迭代 {}] 🛑 收到关闭请求，停止等待剩余结果", iteration);
            break;
        }

        match timeout(RESULT_POLL_INTERVAL, results_rx.recv()).await {
            Ok(Some(result)) => {
                completed += 1;
                if result.succeeded {
                    successful += 1;
                }

                let status = if result.succeeded { "✅" } else { "❌" };
                let worker = WorkerId::for_sequence(result.sequence_number);
                info!(
                    "[迭代 {}] [{}/{}] {} {} {} (#{})",
                    iteration,
                    completed,
                    total,
                    status,
                    worker.label(),
                    result.relative_path.display(),
                    result.sequence_number
                );
            }
            Ok(None) => {
                // 两个 worker 都已退出且不会再有结果
                warn!(
                    "[迭代 {}] ⚠️ worker 已全部退出，仍有 {} 个任务没有结果",
                    iteration,
                    total - completed
                );
                break;
            }
            Err(_) => {
                // 超时：确认 worker 是否还活着
                if handle1.is_finished() && handle2.is_finished() {
                    break;
                }
                continue;
            }
        }
    }

    // ========== 协作式收尾 ==========
    let _ = worker1_tx.send(None); // 毒丸
    let _ = worker2_tx.send(None);

    let _ = timeout(WORKER_JOIN_TIMEOUT, handle1).await;
    let _ = timeout(WORKER_JOIN_TIMEOUT, handle2).await;

    let elapsed = start_time.elapsed();
    info!(
        "[迭代 {}] ✅ 完成: {}/{} 张图像，耗时 {:.1} 秒",
        iteration,
        successful,
        total,
        elapsed.as_secs_f64()
    );

    // 取消时只上报已排空的部分进度，不臆造未完成任务的结果
    let reported_total = if completed < total && shutdown.is_requested() {
        completed
    } else {
        total
    };

    Ok(IterationOutcome {
        successful,
        total: reported_total,
    })
}
