//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批次的生命周期和进度推送，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `strategy` - 查询策略
//! - 每种查询类型一个策略：字段绑定、交互脚本、分类方式、输出列
//! - 新增查询类型只需要新增策略，编排器不变
//!
//! ### `batch_processor` - 批量查询处理器
//! - 导入文件、打开会话、逐条查询、合并结果、写入表格
//! - 保证每条记录恰好一个结果，会话恰好关闭一次
//!
//! ### `progress` - 进度发送端
//! - 有序推送进度事件，终止事件之后不再发送
//! - 客户端断开不影响批次
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Record>)
//!     ↓
//! workflow::LookupFlow (处理单条 Record)
//!     ↓
//! services (能力层：classify / normalize / merge / persist)
//!     ↓
//! browser (基础设施：SessionClient)
//! ```

pub mod batch_processor;
pub mod progress;
pub mod strategy;

// 重新导出主要类型
pub use batch_processor::{BatchOrchestrator, BatchRequest, BatchSummary, DOWNLOAD_PATH};
pub use progress::{channel, ProgressSender};
pub use strategy::LookupStrategy;
