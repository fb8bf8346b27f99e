//! 表格导入层
//!
//! 把上传的文件（电子表格，或包含表格的 docx 文档）解析为统一的 `Table`，
//! 并把客户端给出的列绑定解析为字段角色 → 列名。
//!
//! - 电子表格：第一行是表头，列名是自由文本，由客户端指定哪些列有意义
//! - docx 文档：所有表格的行依次拼接，第一行是表头，字段名按查询类型固定

pub mod document;
pub mod spreadsheet;

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::IngestError;
use crate::models::{FieldRole, Record, Table};

/// 输入文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InputFormat {
    #[serde(rename = "excel")]
    Spreadsheet,
    #[serde(rename = "docx")]
    Document,
}

/// 字段角色 → 列名
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnBindings(IndexMap<FieldRole, String>);

impl ColumnBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// 绑定列，空白列名视为未绑定
    pub fn bind(&mut self, role: FieldRole, column: impl Into<String>) {
        let column = column.into();
        if !column.trim().is_empty() {
            self.0.insert(role, column);
        }
    }

    pub fn with(mut self, role: FieldRole, column: impl Into<String>) -> Self {
        self.bind(role, column);
        self
    }

    pub fn get(&self, role: FieldRole) -> Option<&str> {
        self.0.get(&role).map(String::as_str)
    }

    /// 仅在尚未绑定时设置默认列
    pub fn or_default(mut self, role: FieldRole, column: &str) -> Self {
        if self.get(role).is_none() {
            self.bind(role, column);
        }
        self
    }
}

/// 导入结果
#[derive(Debug, Clone)]
pub struct Ingested {
    pub format: InputFormat,
    pub table: Table,
    /// 已校验的绑定（每个必需角色都对应表中存在的列）
    pub bindings: ColumnBindings,
}

impl Ingested {
    pub fn records(&self) -> Vec<Record> {
        self.table.records()
    }

    pub fn total(&self) -> usize {
        self.table.len()
    }
}

/// 按扩展名判断文件格式
pub fn detect_format(path: &Path) -> Result<InputFormat, IngestError> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" | "xlsm" | "ods" => Ok(InputFormat::Spreadsheet),
        "docx" => Ok(InputFormat::Document),
        _ => Err(IngestError::UnsupportedFormat { extension }),
    }
}

/// 表头去重：重复的列名依次改为 `名称.1`、`名称.2`
///
/// 列查找、记录取值和结果合并都按名称定位列，重名时会指向不同的列。
pub fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    headers
        .into_iter()
        .map(|header| {
            let base = header.trim().to_string();
            if seen.insert(base.clone()) {
                return header;
            }
            let mut n = 1;
            loop {
                let candidate = format!("{}.{}", base, n);
                if seen.insert(candidate.clone()) {
                    debug!("重复表头 {:?} 重命名为 {:?}", header, candidate);
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

/// 读取文件为表格
pub fn read_table(path: &Path) -> Result<(InputFormat, Table), IngestError> {
    let format = detect_format(path)?;
    let table = match format {
        InputFormat::Spreadsheet => spreadsheet::read_spreadsheet(path)?,
        InputFormat::Document => document::read_document(path)?,
    };
    debug!(
        "读取 {:?}: {} 列, {} 行",
        format,
        table.headers().len(),
        table.len()
    );
    Ok((format, table))
}

/// 导入文件并校验字段绑定
///
/// # 参数
/// - `path`: 已保存的上传文件
/// - `required`: 本次查询必需的字段角色
/// - `document_columns`: docx 输入时固定使用的列名
/// - `requested`: 客户端为电子表格指定的列绑定
pub fn ingest(
    path: &Path,
    required: &[FieldRole],
    document_columns: &[(FieldRole, &str)],
    requested: &ColumnBindings,
) -> Result<Ingested, IngestError> {
    let (format, table) = read_table(path)?;

    let bindings = match format {
        InputFormat::Document => document_columns
            .iter()
            .fold(ColumnBindings::new(), |b, (role, column)| b.with(*role, *column)),
        InputFormat::Spreadsheet => requested.clone(),
    };

    for role in required {
        let column = bindings
            .get(*role)
            .ok_or_else(|| IngestError::missing_column(role.query_param()))?;
        if table.column_index(column).is_none() {
            return Err(IngestError::missing_column(column));
        }
    }

    info!("📥 导入完成: {} 条记录 ({:?})", table.len(), format);

    Ok(Ingested {
        format,
        table,
        bindings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("a.XLSX")).unwrap(), InputFormat::Spreadsheet);
        assert_eq!(detect_format(Path::new("a.docx")).unwrap(), InputFormat::Document);
        assert!(matches!(
            detect_format(Path::new("a.csv")),
            Err(IngestError::UnsupportedFormat { extension }) if extension == "csv"
        ));
        assert!(matches!(
            detect_format(Path::new("noext")),
            Err(IngestError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_spreadsheet_missing_declared_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_xlsx(
            dir.path(),
            "input.xlsx",
            &["Roll", "Name"],
            &[&["112233", "Ayesha"]],
        );
        let requested = ColumnBindings::new().with(FieldRole::Roll, "MBBS_Roll");

        let err = ingest(&path, &[FieldRole::Roll], &[], &requested).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { column } if column == "MBBS_Roll"));
    }

    #[test]
    fn test_spreadsheet_unbound_role_is_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_xlsx(dir.path(), "input.xlsx", &["Name"], &[&["A"]]);

        let err = ingest(
            &path,
            &[FieldRole::Name, FieldRole::Mobile],
            &[],
            &ColumnBindings::new().with(FieldRole::Name, "Name"),
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn { column } if column == "mobile_col"));
    }

    #[test]
    fn test_document_uses_fixed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_docx(
            dir.path(),
            "input.docx",
            &[
                &["USER_ID", "Mobile Number"],
                &["U1", "1712345678"],
                &["U2", "01812345678"],
            ],
        );
        // 客户端传入的绑定对 docx 无效
        let requested = ColumnBindings::new().with(FieldRole::UserId, "ignored");

        let ingested = ingest(
            &path,
            &[FieldRole::UserId, FieldRole::Mobile],
            &[(FieldRole::UserId, "USER_ID"), (FieldRole::Mobile, "Mobile Number")],
            &requested,
        )
        .unwrap();

        assert_eq!(ingested.format, InputFormat::Document);
        assert_eq!(ingested.total(), 2);
        assert_eq!(ingested.bindings.get(FieldRole::UserId), Some("USER_ID"));
        assert_eq!(ingested.records()[0].get("Mobile Number"), Some("1712345678"));
    }

    #[test]
    fn test_header_only_document_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_docx(dir.path(), "input.docx", &[&["MBBS_Roll"]]);

        let err = ingest(&path, &[FieldRole::Roll], &[(FieldRole::Roll, "MBBS_Roll")], &ColumnBindings::new())
            .unwrap_err();
        assert!(matches!(err, IngestError::EmptyInput));
    }

    #[test]
    fn test_unique_headers_suffix_duplicates() {
        let headers = vec!["Roll", "Name", " Roll ", "Roll.1", "Roll"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            unique_headers(headers),
            vec!["Roll", "Name", "Roll.1", "Roll.1.1", "Roll.2"]
        );
    }

    #[test]
    fn test_duplicate_header_binds_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_xlsx(
            dir.path(),
            "input.xlsx",
            &["Roll", "Roll"],
            &[&["112233", "x1"], &["445566", "x2"]],
        );

        let ingested = ingest(
            &path,
            &[FieldRole::Roll],
            &[],
            &ColumnBindings::new().with(FieldRole::Roll, "Roll"),
        )
        .unwrap();

        assert_eq!(ingested.table.headers(), &["Roll".to_string(), "Roll.1".to_string()]);
        let records = ingested.records();
        assert_eq!(records[0].get("Roll"), Some("112233"));
        assert_eq!(records[1].get("Roll.1"), Some("x2"));
    }

    #[test]
    fn test_or_default_keeps_explicit_binding() {
        let b = ColumnBindings::new()
            .with(FieldRole::Roll, "Roll")
            .or_default(FieldRole::Roll, "MBBS_Roll");
        assert_eq!(b.get(FieldRole::Roll), Some("Roll"));

        let b = ColumnBindings::new().or_default(FieldRole::Roll, "MBBS_Roll");
        assert_eq!(b.get(FieldRole::Roll), Some("MBBS_Roll"));
    }
}
