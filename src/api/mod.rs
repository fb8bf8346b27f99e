//! HTTP 接口层
//!
//! - `POST /api/{kind}/upload`：上传输入文件，返回可用字段
//! - `GET /api/{kind}/process`：开始批次，以 SSE 推送进度
//! - `GET /api/results/download`：下载结果表格
//! - `GET /health`

pub mod download;
pub mod handlers;
pub mod process;
pub mod routes;
pub mod state;
pub mod upload;

pub use handlers::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
