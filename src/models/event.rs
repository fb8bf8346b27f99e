//! 进度事件
//!
//! 每个事件序列化为一个独立的 JSON 对象，经 SSE 逐条推送给客户端。

use indexmap::IndexMap;
use serde::Serialize;

/// 单值模式下的运行计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub found: usize,
    #[serde(rename = "notFound")]
    pub not_found: usize,
    #[serde(rename = "errorCount")]
    pub error_count: usize,
}

impl Counters {
    pub fn sum(&self) -> usize {
        self.found + self.not_found + self.error_count
    }
}

/// 一条记录处理完成后的快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordEvent {
    /// 回显的输入字段 + 结果字段
    #[serde(flatten)]
    pub fields: IndexMap<String, String>,
    pub processed: usize,
    pub total: usize,
    /// 只在单值分类模式下出现
    #[serde(flatten)]
    pub counters: Option<Counters>,
}

/// 进度事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProgressEvent {
    /// 导入完成，记录总数已确定
    Started { total: usize },
    /// 一条记录处理完成
    Record(RecordEvent),
    /// 批次结束，结果表格已生成
    Completed {
        download: String,
        file: String,
        total: usize,
        processed: usize,
        #[serde(flatten)]
        counters: Option<Counters>,
    },
    /// 批次无法开始（或无法生成结果）
    Failed { error: String },
}

impl ProgressEvent {
    /// 是否为终止事件（之后不会再有任何事件）
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::Completed { .. } | ProgressEvent::Failed { .. })
    }
}
