//! 结果表格写入

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::StoreError;
use crate::models::Table;

/// 把表格写为 xlsx（单个工作表，首行为表头，单元格全部写成文本）
pub fn write_xlsx(table: &Table, path: &Path) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header_format = Format::new().set_bold();

    for (col, header) in table.headers().iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }

    for (r, row) in table.rows().iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            sheet.write_string(r as u32 + 1, col as u16, value)?;
        }
    }

    workbook.save(path).map_err(|e| StoreError::WriteFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    info!(
        "结果表格已写入: {} ({} 行 × {} 列)",
        path.display(),
        table.len(),
        table.headers().len()
    );
    Ok(())
}
