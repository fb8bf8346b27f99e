//! 文件仓库 - 业务能力层
//!
//! 上传目录和结果目录各是一个 `FileStore`。对外只暴露文件名（句柄），
//! 句柄必须解析到仓库根目录之内。

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 创建根目录（已存在时无操作）
    pub fn ensure_root(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// 把句柄解析为仓库内的路径
    ///
    /// 句柄只能是一个普通的相对路径；`..`、绝对路径、空句柄都返回 `InvalidHandle`。
    /// 文件存在时还会在规范化后再检查一次前缀，防止符号链接逃逸。
    pub fn resolve(&self, handle: &str) -> Result<PathBuf, StoreError> {
        let trimmed = handle.trim();
        if trimmed.is_empty() {
            return Err(StoreError::invalid_handle(handle));
        }

        let relative = Path::new(trimmed);
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            warn!("拒绝非法句柄: {:?}", handle);
            return Err(StoreError::invalid_handle(handle));
        }

        let candidate = self.root.join(relative);
        if !candidate.is_file() {
            return Err(StoreError::NotFound {
                handle: handle.to_string(),
            });
        }

        let root = self.root.canonicalize()?;
        let resolved = candidate.canonicalize()?;
        if !resolved.starts_with(&root) {
            warn!("句柄解析到仓库之外: {:?} -> {}", handle, resolved.display());
            return Err(StoreError::invalid_handle(handle));
        }

        Ok(resolved)
    }

    /// 保存上传文件，返回存储名 `<uuid>_<清理后的原文件名>`
    pub async fn save_upload(&self, original_name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let stored = format!("{}_{}", Uuid::new_v4(), sanitize_file_name(original_name));
        let path = self.root.join(&stored);
        tokio::fs::write(&path, bytes).await?;
        debug!("上传文件已保存: {} ({} 字节)", path.display(), bytes.len());
        Ok(stored)
    }

    /// 生成新的结果句柄 `result_<uuid>.xlsx`
    pub fn new_result_handle(&self) -> String {
        format!("result_{}.xlsx", Uuid::new_v4().simple())
    }

    /// 句柄对应的写入路径（句柄由本仓库生成，不做解析检查）
    pub fn path_for(&self, handle: &str) -> PathBuf {
        self.root.join(handle)
    }
}

/// 只保留文件名部分，非 `[A-Za-z0-9._-]` 的字符替换为 `_`
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
