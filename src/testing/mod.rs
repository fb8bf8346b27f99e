//! 测试工具
//!
//! 提供会话替身和输入文件构造函数，让批处理流程可以在没有浏览器的情况下完整测试。
//! 只在单元测试或启用 `testing` 特性时编译。

mod scripted_session;

pub use scripted_session::{RecordedCall, Scripted, ScriptedSession, ScriptedSessionFactory};

/// 测试输入文件
pub mod fixtures {
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use rust_xlsxwriter::Workbook;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    /// 写一个 xlsx 文件；纯数字（且不以 0 开头）的单元格写成数字，模拟用户直接在 Excel 里输入
    pub fn write_xlsx(dir: &Path, name: &str, headers: &[&str], rows: &[&[&str]]) -> PathBuf {
        let path = dir.join(name);
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in headers.iter().enumerate() {
            sheet
                .write_string(0, col as u16, *header)
                .expect("写入表头失败");
        }
        for (r, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                let (r, col) = (r as u32 + 1, col as u16);
                match value.parse::<f64>() {
                    Ok(number) if !value.starts_with('0') => {
                        sheet.write_number(r, col, number).expect("写入单元格失败");
                    }
                    _ if value.is_empty() => {}
                    _ => {
                        sheet.write_string(r, col, *value).expect("写入单元格失败");
                    }
                }
            }
        }

        workbook.save(&path).expect("保存 xlsx 失败");
        path
    }

    /// 生成一个 `<w:tbl>` 片段（单元格文本不做转义）
    pub fn docx_table_xml(rows: &[&[&str]]) -> String {
        let mut xml = String::from("<w:tbl>");
        for row in rows {
            xml.push_str("<w:tr>");
            for cell in row.iter() {
                xml.push_str(&format!(
                    "<w:tc><w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p></w:tc>",
                    cell
                ));
            }
            xml.push_str("</w:tr>");
        }
        xml.push_str("</w:tbl>");
        xml
    }

    /// 包装为完整的 document.xml
    pub fn docx_body(inner: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            inner
        )
    }

    /// 写一个只包含一个表格的 docx 文件；`rows` 为空时不写表格
    pub fn write_docx(dir: &Path, name: &str, rows: &[&[&str]]) -> PathBuf {
        let body = if rows.is_empty() {
            docx_body("<w:p><w:r><w:t>empty</w:t></w:r></w:p>")
        } else {
            docx_body(&docx_table_xml(rows))
        };

        let path = dir.join(name);
        let file = File::create(&path).expect("创建 docx 失败");
        let mut zip = ZipWriter::new(file);
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .expect("写入 docx 失败");
        zip.write_all(body.as_bytes()).expect("写入 docx 失败");
        zip.finish().expect("保存 docx 失败");
        path
    }
}
