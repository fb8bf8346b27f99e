//! 电子表格读取（xlsx / xls / xlsm / ods）

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use super::unique_headers;
use crate::error::IngestError;
use crate::models::Table;

/// 读取第一个工作表，第一行作为表头
///
/// 完全空白的数据行会被跳过；空表头命名为 `Unnamed: <列号>`，重复表头加 `.1`、`.2` 后缀。
pub fn read_spreadsheet(path: &Path) -> Result<Table, IngestError> {
    let display = path.display().to_string();

    let mut workbook =
        open_workbook_auto(path).map_err(|e| IngestError::spreadsheet(&display, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyInput)?
        .map_err(|e| IngestError::spreadsheet(&display, e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or(IngestError::EmptyInput)?
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let text = cell_text(cell);
            if text.trim().is_empty() {
                format!("Unnamed: {}", i)
            } else {
                text
            }
        })
        .collect();

    let data = rows
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.trim().is_empty()))
        .collect();

    Ok(Table::new(unique_headers(headers), data))
}

/// 单元格转文本；没有小数部分的数字不带 `.0`，保证学号/手机号原样保留
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
