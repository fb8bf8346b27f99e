use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use super::handlers::ApiError;
use super::state::AppState;
use crate::error::AppError;
use crate::ingest::{detect_format, read_table, InputFormat};
use crate::models::LookupKind;

/// 接受的 multipart 字段名
const FILE_FIELDS: [&str; 2] = ["file", "input_file"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub kind: LookupKind,
    pub format: InputFormat,
    /// 存储名，作为 process 接口的 `file` 参数
    pub stored_path: String,
    /// 表头中的字段名，供客户端选择列绑定
    pub available_fields: Vec<String>,
}

/// POST /api/{kind}/upload
///
/// 保存上传文件并读取表头；无法解析的文件不会保留。
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<LookupKind>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("无法读取上传内容: {}", e)))?
    {
        let is_file = field.name().is_some_and(|name| FILE_FIELDS.contains(&name));
        if !is_file {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("无法读取上传文件: {}", e)))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;
    if file_name.trim().is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }

    let format = detect_format(std::path::Path::new(&file_name))?;
    let stored = state.uploads().save_upload(&file_name, &bytes).await?;
    let path = state.uploads().path_for(&stored);

    let read_path = path.clone();
    let table = tokio::task::spawn_blocking(move || read_table(&read_path))
        .await
        .map_err(|e| AppError::Config(format!("读取任务失败: {}", e)))?;

    let table = match table {
        Ok((_, table)) => table,
        Err(e) => {
            warn!("⚠️ 上传文件无法解析，已删除: {} ({})", stored, e);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }
    };

    info!(
        "📤 [{}] 上传完成: {} → {} ({} 行)",
        kind,
        file_name,
        stored,
        table.len()
    );

    Ok(Json(UploadResponse {
        kind,
        format,
        stored_path: stored,
        available_fields: table.headers().to_vec(),
    }))
}
