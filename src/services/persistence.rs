//! 图像落盘 - 业务能力层
//!
//! 只负责"把生成的图像字节写到磁盘并校验"，校验失败时删除残留文件，
//! 不向上层暴露半成品。

use crate::error::{AppResult, FileError};
use std::path::Path;
use tracing::debug;

/// 写入图像字节并校验文件是结构完整的图像
///
/// 校验失败时删除已写入的文件再返回错误，调用方看到的要么是
/// 一个可解码的图像文件，要么什么都没有。
pub async fn save_and_verify(image_bytes: &[u8], output_path: &Path) -> AppResult<()> {
    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FileError::CreateDirFailed {
                path: parent.display().to_string(),
                source: Box::new(e),
            })?;
    }

    tokio::fs::write(output_path, image_bytes)
        .await
        .map_err(|e| FileError::WriteFailed {
            path: output_path.display().to_string(),
            source: Box::new(e),
        })?;

    // 解码校验，防止把损坏的响应体当成功结果留在输出目录里
    match image::open(output_path) {
        Ok(_) => {
            debug!("图像已保存并通过校验: {}", output_path.display());
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(output_path).await;
            Err(FileError::VerifyFailed {
                path: output_path.display().to_string(),
                source: Box::new(e),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 生成一张最小的合法 PNG
    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::new(2, 2);
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_valid_image_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("fox_L1.png");

        save_and_verify(&tiny_png(), &path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_invalid_bytes_are_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken_L1.png");

        let result = save_and_verify(b"not an image at all", &path).await;
        assert!(result.is_err());
        // 残留文件必须被清理
        assert!(!path.exists());
    }
}
