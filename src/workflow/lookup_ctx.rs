//! 记录处理上下文
//!
//! 封装"我正在处理哪个批次的第几条记录"这一信息

use std::fmt::Display;

use crate::models::LookupKind;

/// 记录处理上下文
#[derive(Debug, Clone, Copy)]
pub struct RecordCtx {
    pub kind: LookupKind,

    /// 记录序号（从1开始，仅用于日志显示）
    pub index: usize,

    pub total: usize,
}

impl RecordCtx {
    pub fn new(kind: LookupKind, index: usize, total: usize) -> Self {
        Self { kind, index, total }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}/{}]", self.kind, self.index, self.total)
    }
}
