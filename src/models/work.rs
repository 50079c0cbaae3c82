use std::path::PathBuf;

/// 单张图像的处理任务
///
/// 入队之后不可变。`sequence_number` 在发现阶段按路径排序分配（1-based），
/// 同时用于 worker 分配和结果归属，绝不复用或修改。
#[derive(Debug, Clone)]
pub struct WorkItem {
    /// 源图像的完整路径
    pub source_path: PathBuf,
    /// 相对于本轮输入目录的路径（用于日志）
    pub relative_path: PathBuf,
    /// 1-based 序号（按路径字典序分配）
    pub sequence_number: usize,
    /// 本轮迭代的输出目录
    pub output_directory: PathBuf,
}

/// 单张图像的处理结果
///
/// 每个 WorkItem 恰好产生一个 WorkResult，由处理它的 worker 发出，
/// 由协调器消费一次。
#[derive(Debug, Clone)]
pub struct WorkResult {
    pub source_path: PathBuf,
    pub relative_path: PathBuf,
    pub sequence_number: usize,
    pub succeeded: bool,
    /// 成功时为输出文件路径，失败时为原因说明
    pub detail: String,
}

/// Worker 编号（固定两个）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerId {
    Worker1,
    Worker2,
}

impl WorkerId {
    /// 根据序号确定性地分配 worker：奇数 → Worker1，偶数 → Worker2
    ///
    /// 这是吞吐均衡的交错策略，同时保证同一目录列表下的分配可复现。
    pub fn for_sequence(sequence_number: usize) -> Self {
        if sequence_number % 2 == 1 {
            WorkerId::Worker1
        } else {
            WorkerId::Worker2
        }
    }

    /// 日志中使用的短标签
    pub fn label(&self) -> &'static str {
        match self {
            WorkerId::Worker1 => "W1",
            WorkerId::Worker2 => "W2",
        }
    }
}

impl std::fmt::Display for WorkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerId::Worker1 => write!(f, "Worker-1"),
            WorkerId::Worker2 => write!(f, "Worker-2"),
        }
    }
}

/// 单轮迭代的统计结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationOutcome {
    /// 成功生成的图像数量
    pub successful: usize,
    /// 本轮计入的任务总数（正常完成时为入队数量，取消时为已完成数量）
    pub total: usize,
}

/// 整条链路的汇总统计
#[derive(Debug, Clone, Default)]
pub struct ChainSummary {
    pub total_successful: usize,
    pub total_processed: usize,
    /// 每轮迭代的明细：(迭代编号, 统计)
    pub per_iteration: Vec<(u32, IterationOutcome)>,
}

impl ChainSummary {
    /// 累加一轮迭代的结果
    pub fn record(&mut self, iteration: u32, outcome: IterationOutcome) {
        self.total_successful += outcome.successful;
        self.total_processed += outcome.total;
        self.per_iteration.push((iteration, outcome));
    }
}
