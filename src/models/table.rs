//! 表格与记录
//!
//! 上传文件被统一解析为 `Table`（表头 + 文本单元格），每一行对应一条 `Record`。

use indexmap::IndexMap;

/// 统一的文本表格
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// 创建表格，每一行会被补齐/截断到表头长度
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// 数据行数量（不含表头）
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 按名称查找列（忽略首尾空白）
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// 读取单元格
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// 确保某列存在，不存在时追加一列空值，返回列索引
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.headers.iter().position(|h| h == name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// 写入单元格，越界时忽略
    pub fn set(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value.into();
        }
    }

    /// 按映射表重命名列，未出现在映射表中的列保持不变
    pub fn rename_columns<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<&'static str>,
    {
        for header in &mut self.headers {
            if let Some(new_name) = lookup(header) {
                *header = new_name.to_string();
            }
        }
    }

    /// 将所有数据行转换为记录（按行顺序）
    pub fn records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, row)| Record {
                index,
                fields: self
                    .headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect(),
            })
            .collect()
    }
}

/// 一条输入记录：字段名 → 原始值（有序）
///
/// 身份由行号 `index` 加上关键字段共同确定，导入后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: usize,
    fields: IndexMap<String, String>,
}

impl Record {
    pub fn new(index: usize, fields: IndexMap<String, String>) -> Self {
        Self { index, fields }
    }

    /// 读取字段原始值
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .or_else(|| {
                let field = field.trim();
                self.fields
                    .iter()
                    .find(|(name, _)| name.trim() == field)
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(
            vec!["Roll".into(), " Name ".into()],
            vec![
                vec!["112233".into(), "Ayesha".into()],
                vec!["445566".into()],
            ],
        )
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = sample();
        assert_eq!(table.cell(1, 1), Some(""));
    }

    #[test]
    fn test_column_lookup_ignores_whitespace() {
        let table = sample();
        assert_eq!(table.column_index("Name"), Some(1));
        assert_eq!(table.column_index("Missing"), None);
    }

    #[test]
    fn test_ensure_column_appends_once() {
        let mut table = sample();
        let idx = table.ensure_column("Result_1");
        assert_eq!(idx, 2);
        assert_eq!(table.ensure_column("Result_1"), 2);
        assert_eq!(table.rows()[0].len(), 3);
    }

    #[test]
    fn test_records_keep_row_order() {
        let records = sample().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].index, 1);
        assert_eq!(records[0].get("Name"), Some("Ayesha"));
        assert_eq!(records[1].get("Roll"), Some("445566"));
    }
}
