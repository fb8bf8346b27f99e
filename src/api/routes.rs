use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{download, handlers, process, upload};
use super::state::AppState;

/// 上传文件大小上限
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // 结果下载
        .route("/api/results/download", get(download::download))
        // 按查询类型：上传 + 处理
        .route("/api/{kind}/upload", post(upload::upload))
        .route("/api/{kind}/process", get(process::process))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
