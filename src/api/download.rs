use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;

use super::handlers::ApiError;
use super::state::AppState;
use crate::error::StoreError;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub file: String,
}

/// GET /api/results/download
///
/// 句柄必须解析到结果目录之内，否则 403；文件不存在 404。
pub async fn download(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state.results().resolve(&params.file)?;
    let bytes = tokio::fs::read(&path).await.map_err(StoreError::from)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("result.xlsx")
        .to_string();

    info!("💾 下载结果: {} ({} 字节)", file_name, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    ))
}
