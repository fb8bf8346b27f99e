//! # Result Lookup
//!
//! 批量查询服务：上传一份名单，逐条驱动外部查询表单，实时推送进度，
//! 最后把查询结果合并回原表并生成可下载的表格。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 持有稀缺资源（浏览器页面），只暴露会话能力
//! - `SessionClient` - 导航 / 填写 / 点击 / 等待文本
//! - `SessionGuard` - 保证每个会话只关闭一次
//!
//! ### ② 导入与业务能力层（Ingest / Services）
//! - `ingest/` - 电子表格与 docx 表格 → 统一的 `Table`
//! - `services/` - 分类、规范化、结果合并、结果写入、文件仓库
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条记录"的完整查询流程
//! - `RecordCtx` - 上下文封装（kind + 序号）
//! - `LookupFlow` - 流程编排（navigate → fill → activate → wait → classify）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/strategy` - 每种查询类型的策略
//! - `orchestrator/batch_processor` - 批次状态机，管理会话与进度
//!
//! ### ⑤ 接口层（API）
//! - `api/` - axum 路由：上传、SSE 处理、下载
//!
//! ## 模块结构

pub mod api;
pub mod browser;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod services;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use api::{create_router, AppState};
pub use browser::{ChromeSessionFactory, SessionClient, SessionFactory};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{LookupKind, ProgressEvent};
pub use orchestrator::{BatchOrchestrator, BatchRequest, BatchSummary};
pub use workflow::{LookupFlow, RecordCtx};
