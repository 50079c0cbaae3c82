//! 图像文件发现 - 业务能力层
//!
//! 只负责"列出一个目录里的图像文件"，非递归，结果去重并按路径排序，
//! 保证同一目录内容下的发现顺序可复现。

use crate::error::AppResult;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// 列出目录中所有受支持格式的图像文件（仅当前层，不含子目录）
///
/// 扩展名匹配不区分大小写。目录不存在时返回空列表而不是错误，
/// 由调用方决定如何处理"无输入"。
pub async fn list_image_files(
    input_dir: &Path,
    supported_formats: &[String],
) -> AppResult<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        warn!("输入目录不存在: {}", input_dir.display());
        return Ok(Vec::new());
    }

    let mut image_files = Vec::new();
    let mut entries = fs::read_dir(input_dir).await.map_err(|e| {
        crate::error::AppError::file_read_failed(input_dir.display().to_string(), e)
    })?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(ext) = path.extension().and_then(|s| s.to_str()) {
            let ext_lower = format!(".{}", ext.to_lowercase());
            if supported_formats
                .iter()
                .any(|fmt| fmt.to_lowercase() == ext_lower)
            {
                image_files.push(path);
            }
        }
    }

    // 去重 + 字典序排序，保证序号分配可复现
    image_files.sort();
    image_files.dedup();

    Ok(image_files)
}
