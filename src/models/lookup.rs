//! 查询类型与查询结果

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 查询类型（封闭枚举）
///
/// HTTP 路径中的 `{kind}` 直接反序列化为该枚举，未知类型在边界处被拒绝。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    /// MBBS 用户 ID 查询
    MbbsUserId,
    /// BDS 用户 ID 查询
    BdsUserId,
    /// MBBS 密码找回
    MbbsPassRecover,
    /// BDS 密码找回
    BdsPassRecover,
    /// MBBS 成绩查询
    MbbsResult,
    /// BDS 成绩查询
    BdsResult,
}

/// 查询家族：同一家族共享交互脚本和分类规则，只有表单地址和输出列名不同
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFamily {
    UserId,
    PassRecover,
    ExamResult,
}

impl LookupKind {
    pub const ALL: [LookupKind; 6] = [
        LookupKind::MbbsUserId,
        LookupKind::BdsUserId,
        LookupKind::MbbsPassRecover,
        LookupKind::BdsPassRecover,
        LookupKind::MbbsResult,
        LookupKind::BdsResult,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LookupKind::MbbsUserId => "mbbs_user_id",
            LookupKind::BdsUserId => "bds_user_id",
            LookupKind::MbbsPassRecover => "mbbs_pass_recover",
            LookupKind::BdsPassRecover => "bds_pass_recover",
            LookupKind::MbbsResult => "mbbs_result",
            LookupKind::BdsResult => "bds_result",
        }
    }

    /// 专业前缀（MBBS / BDS）
    pub fn program(self) -> &'static str {
        match self {
            LookupKind::MbbsUserId | LookupKind::MbbsPassRecover | LookupKind::MbbsResult => "MBBS",
            LookupKind::BdsUserId | LookupKind::BdsPassRecover | LookupKind::BdsResult => "BDS",
        }
    }

    pub fn family(self) -> LookupFamily {
        match self {
            LookupKind::MbbsUserId | LookupKind::BdsUserId => LookupFamily::UserId,
            LookupKind::MbbsPassRecover | LookupKind::BdsPassRecover => LookupFamily::PassRecover,
            LookupKind::MbbsResult | LookupKind::BdsResult => LookupFamily::ExamResult,
        }
    }
}

impl fmt::Display for LookupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 记录中字段的语义角色
///
/// 表格的表头是自由文本，由客户端把列名绑定到角色上。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    Name,
    Father,
    Mobile,
    UserId,
    Roll,
}

impl FieldRole {
    /// 处理请求中对应的查询参数名
    pub fn query_param(self) -> &'static str {
        match self {
            FieldRole::Name => "name_col",
            FieldRole::Father => "father_col",
            FieldRole::Mobile => "mobile_col",
            FieldRole::UserId => "user_col",
            FieldRole::Roll => "roll_col",
        }
    }
}

/// 一条记录规范化后的查询输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    /// 关键字段值（已去除首尾空白），用于结果回填
    pub key: String,
    /// 各角色规范化后的输入值，按填写顺序
    pub values: IndexMap<FieldRole, String>,
}

impl LookupRequest {
    pub fn value(&self, role: FieldRole) -> &str {
        self.values.get(&role).map(String::as_str).unwrap_or("")
    }
}

/// 单值分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Found,
    NotFound,
    Error,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Found => "found",
            OutcomeKind::NotFound => "not_found",
            OutcomeKind::Error => "error",
        }
    }
}

/// 查询结果的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeValue {
    /// 单值模式：原始文本（或占位文本）+ 分类
    Classified { text: String, kind: OutcomeKind },
    /// 多值模式：按位置保存的文本片段，不做分类
    Fragments(Vec<String>),
}

/// 一条记录的查询结果
///
/// 每条记录恰好产生一个结果，失败也会被转换为占位结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOutcome {
    /// 源记录的关键字段值（已去除首尾空白）
    pub key: String,
    /// 处理顺序（从 0 开始）
    pub sequence: usize,
    pub value: OutcomeValue,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_path_segment() {
        for kind in LookupKind::ALL {
            let parsed: LookupKind =
                serde_json::from_value(serde_json::Value::String(kind.as_str().to_string())).unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let parsed: Result<LookupKind, _> =
            serde_json::from_value(serde_json::Value::String("management".to_string()));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_families() {
        assert_eq!(LookupKind::BdsUserId.family(), LookupFamily::UserId);
        assert_eq!(LookupKind::MbbsPassRecover.family(), LookupFamily::PassRecover);
        assert_eq!(LookupKind::BdsResult.family(), LookupFamily::ExamResult);
        assert_eq!(LookupKind::BdsResult.program(), "BDS");
    }
}
