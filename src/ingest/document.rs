//! docx 表格读取
//!
//! 只读取 `word/document.xml` 中的表格：所有表格的行依次拼接，
//! 单元格内多个段落用换行连接，首尾空白去除。

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use super::unique_headers;
use crate::error::IngestError;
use crate::models::Table;

const DOCUMENT_PART: &str = "word/document.xml";

/// 读取 docx 中的表格，第一行作为表头
///
/// 没有表格行，或只有表头时返回 `EmptyInput`。
pub fn read_document(path: &Path) -> Result<Table, IngestError> {
    let display = path.display().to_string();

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| IngestError::document(&display, e))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| IngestError::document(&display, e))?
        .read_to_string(&mut xml)?;

    let rows = parse_table_rows(&xml).map_err(|e| IngestError::document(&display, e))?;
    if rows.len() < 2 {
        return Err(IngestError::EmptyInput);
    }

    let mut rows = rows.into_iter();
    let headers = rows.next().unwrap_or_default();
    Ok(Table::new(unique_headers(headers), rows.collect()))
}

/// 从 WordprocessingML 中提取顶层表格的所有行
pub fn parse_table_rows(xml: &str) -> Result<Vec<Vec<String>>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);

    let mut rows = Vec::new();
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<String> = None;
    let mut in_text = false;
    // 嵌套表格的内容并入外层单元格
    let mut depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"tbl" => depth += 1,
                b"tr" if depth == 1 => row = Some(Vec::new()),
                b"tc" if depth == 1 => cell = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(c) = cell.as_mut() {
                    match e.local_name().as_ref() {
                        b"tab" => c.push('\t'),
                        b"br" | b"cr" => c.push('\n'),
                        _ => {}
                    }
                }
            }
            Event::Text(t) if in_text => {
                if let Some(c) = cell.as_mut() {
                    c.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if depth == 1 => {
                    if let Some(c) = cell.as_mut() {
                        c.push('\n');
                    }
                }
                b"tc" if depth == 1 => {
                    if let (Some(r), Some(c)) = (row.as_mut(), cell.take()) {
                        r.push(c.trim().to_string());
                    }
                }
                b"tr" if depth == 1 => {
                    if let Some(r) = row.take() {
                        rows.push(r);
                    }
                }
                b"tbl" => depth = depth.saturating_sub(1),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(rows)
}
