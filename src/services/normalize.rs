//! 输入值规范化

/// 输入框填写前的规范化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// 原样填写
    AsIs,
    /// 去除首尾空白
    Trim,
    /// 手机号：去除首尾空白，缺少前导 0 时补上
    Phone,
}

impl Normalization {
    pub fn apply(self, raw: &str) -> String {
        match self {
            Normalization::AsIs => raw.to_string(),
            Normalization::Trim => raw.trim().to_string(),
            Normalization::Phone => normalize_phone(raw),
        }
    }
}

/// 手机号补前导 0
///
/// Excel 会把 `01712345678` 存成数字 `1712345678`，查询表单要求 11 位带 0 的号码。
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('0') {
        trimmed.to_string()
    } else {
        format!("0{}", trimmed)
    }
}
