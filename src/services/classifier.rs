//! 结果分类服务 - 业务能力层
//!
//! 单值模式：按顺序检查失败标记 → 正向格式 → 兜底，先命中者生效。
//! 多值模式：不分类，只保留文本片段；失败或为空时替换为一个占位片段。

use regex::Regex;
use tracing::debug;

use crate::error::SessionError;
use crate::models::OutcomeKind;

/// 失败标记：文本（忽略大小写）包含 `needle` 时归为 `kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub needle: &'static str,
    pub kind: OutcomeKind,
}

impl Marker {
    pub const fn not_found(needle: &'static str) -> Self {
        Self {
            needle,
            kind: OutcomeKind::NotFound,
        }
    }

    pub const fn error(needle: &'static str) -> Self {
        Self {
            needle,
            kind: OutcomeKind::Error,
        }
    }
}

/// 由哪条规则做出的判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// 命中失败标记
    Marker(&'static str),
    /// 符合正向格式
    Pattern,
    /// 没有命中任何规则，默认归为 Found
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: OutcomeKind,
    pub decided_by: Decision,
}

/// 单值分类器
#[derive(Debug, Clone)]
pub struct OutcomeClassifier {
    markers: Vec<Marker>,
    positive: Option<Regex>,
}

impl OutcomeClassifier {
    /// 创建分类器；标记按给定顺序检查
    pub fn new(markers: &[Marker]) -> Self {
        Self {
            markers: markers.to_vec(),
            positive: None,
        }
    }

    /// 设置正向格式（区分大小写，匹配原始文本）
    pub fn with_positive_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.positive = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn classify(&self, text: &str) -> Classification {
        let lower = text.to_lowercase();

        for marker in &self.markers {
            if lower.contains(&marker.needle.to_lowercase()) {
                return Classification {
                    kind: marker.kind,
                    decided_by: Decision::Marker(marker.needle),
                };
            }
        }

        if let Some(re) = &self.positive {
            if re.is_match(text) {
                return Classification {
                    kind: OutcomeKind::Found,
                    decided_by: Decision::Pattern,
                };
            }
        }

        // TODO: 兜底归为 Found 沿用了旧行为，确认目标站点的返回格式后考虑改为 Error
        debug!("结果未命中任何规则，按兜底归为 Found: {:?}", text);
        Classification {
            kind: OutcomeKind::Found,
            decided_by: Decision::Fallback,
        }
    }
}

/// 交互失败时写入结果的占位文本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePlaceholder {
    /// 前缀 + 错误描述
    Describe(&'static str),
    /// 固定文本
    Fixed(&'static str),
}

impl FailurePlaceholder {
    pub fn render(self, error: &SessionError) -> String {
        match self {
            FailurePlaceholder::Describe(prefix) => format!("{}{}", prefix, error),
            FailurePlaceholder::Fixed(text) => text.to_string(),
        }
    }
}

/// 多值模式：提取为空时的占位片段
pub const EMPTY_FRAGMENTS_PLACEHOLDER: &str = "Result not found";

/// 多值模式：提取失败时的占位前缀
pub const FRAGMENT_FAILURE: FailurePlaceholder = FailurePlaceholder::Describe("Error: ");

/// 多值模式下的提取结果 → 片段序列
pub fn fragments_or_placeholder(extracted: Result<Vec<String>, SessionError>) -> Vec<String> {
    match extracted {
        Ok(fragments) if fragments.is_empty() => vec![EMPTY_FRAGMENTS_PLACEHOLDER.to_string()],
        Ok(fragments) => fragments,
        Err(e) => vec![FRAGMENT_FAILURE.render(&e)],
    }
}
