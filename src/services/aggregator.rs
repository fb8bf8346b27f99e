//! 结果合并服务 - 业务能力层
//!
//! 只负责"把结果按关键字段回填到原表"，不关心结果从哪里来。

use indexmap::IndexMap;
use phf::phf_map;

use crate::models::{LookupOutcome, OutcomeValue, Table};

/// 多值模式下 `Result_i` 列的固定改名表
pub static RESULT_COLUMN_RENAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "Result_1" => "Roll No",
    "Result_2" => "Student Name",
    "Result_3" => "Test Score",
    "Result_4" => "Merit Score",
    "Result_5" => "Merit Position",
    "Result_6" => "Allotted College Code",
    "Result_7" => "Status",
};

/// 结果写入哪些列
#[derive(Debug, Clone)]
pub enum OutputColumns {
    /// 单值模式：结果文本一列，可选一列分类状态
    Single {
        result: String,
        status: Option<&'static str>,
    },
    /// 多值模式：第 i 个片段写入 `{prefix}{i}`，合并后按改名表重命名
    Multi {
        prefix: &'static str,
        renames: Option<&'static phf::Map<&'static str, &'static str>>,
    },
}

impl OutputColumns {
    /// 一条结果展开后的 (列名, 值)
    pub fn derive(&self, value: &OutcomeValue) -> IndexMap<String, String> {
        let mut columns = IndexMap::new();
        match (self, value) {
            (OutputColumns::Single { result, status }, OutcomeValue::Classified { text, kind }) => {
                columns.insert(result.clone(), text.clone());
                if let Some(status) = status {
                    columns.insert((*status).to_string(), kind.as_str().to_string());
                }
            }
            (OutputColumns::Multi { prefix, .. }, OutcomeValue::Fragments(fragments)) => {
                for (i, fragment) in fragments.iter().enumerate() {
                    columns.insert(format!("{}{}", prefix, i + 1), fragment.clone());
                }
            }
            (OutputColumns::Single { result, .. }, OutcomeValue::Fragments(fragments)) => {
                columns.insert(result.clone(), fragments.join(" "));
            }
            (OutputColumns::Multi { prefix, .. }, OutcomeValue::Classified { text, .. }) => {
                columns.insert(format!("{}1", prefix), text.clone());
            }
        }
        columns
    }

    /// 无论有没有结果都要出现在结果表中的列
    fn fixed(&self) -> Vec<String> {
        match self {
            OutputColumns::Single { result, status } => {
                let mut cols = vec![result.clone()];
                cols.extend(status.map(str::to_string));
                cols
            }
            OutputColumns::Multi { .. } => Vec::new(),
        }
    }
}

/// 把结果按关键字段合并回原表
///
/// - 关键字段按去除首尾空白后的文本比较
/// - 同一关键字段对应多行时，每一行都会写入结果
/// - 没有结果的行保持空值
pub fn merge_outcomes(
    table: &Table,
    key_column: &str,
    outcomes: &[LookupOutcome],
    output: &OutputColumns,
) -> Table {
    let mut merged = table.clone();
    for column in output.fixed() {
        merged.ensure_column(&column);
    }

    let key_idx = merged.column_index(key_column);

    // 同一关键字段出现多次时，按处理顺序后者覆盖前者
    let mut ordered: Vec<&LookupOutcome> = outcomes.iter().collect();
    ordered.sort_by_key(|o| o.sequence);

    for outcome in ordered {
        let derived = output.derive(&outcome.value);
        let targets: Vec<(usize, String)> = derived
            .into_iter()
            .map(|(name, value)| (merged.ensure_column(&name), value))
            .collect();

        let Some(key_idx) = key_idx else { continue };
        let matching: Vec<usize> = (0..merged.len())
            .filter(|&row| merged.cell(row, key_idx).map(str::trim) == Some(outcome.key.trim()))
            .collect();

        for row in matching {
            for (col, value) in &targets {
                merged.set(row, *col, value.clone());
            }
        }
    }

    if let OutputColumns::Multi {
        renames: Some(renames),
        ..
    } = output
    {
        merged.rename_columns(|header| renames.get(header).copied());
    }

    merged
}
