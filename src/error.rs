use std::time::Duration;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文件导入错误（对整个批次致命）
    #[error("导入错误: {0}")]
    Ingest(#[from] IngestError),
    /// 浏览器会话错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 文件存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),
}

/// 导入上传文件时的错误
#[derive(Debug, Error)]
pub enum IngestError {
    /// 不支持的文件扩展名
    #[error("不支持的文件格式: {extension}")]
    UnsupportedFormat { extension: String },
    /// 文档只有表头，没有数据行
    #[error("文档中没有找到数据行")]
    EmptyInput,
    /// 调用方声明的列不存在或未指定
    #[error("缺少列: {column}")]
    MissingColumn { column: String },
    /// 表格解析失败
    #[error("读取表格失败 ({path}): {message}")]
    Spreadsheet { path: String, message: String },
    /// 文档解析失败
    #[error("解析文档失败 ({path}): {message}")]
    Document { path: String, message: String },
    /// 读取文件失败
    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),
}

/// 外部会话交互错误
///
/// 单条记录上的交互错误会被吸收为占位结果，不会中断批次。
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// 在限定时间内没有等到目标元素
    #[error("等待元素超时 ({locator}, {}s)", .timeout.as_secs())]
    InteractionTimeout { locator: String, timeout: Duration },
    /// 导航/填写/点击失败
    #[error("交互失败: {0}")]
    InteractionError(String),
    /// 无法启动浏览器会话
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
}

/// 文件存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 句柄为空、是绝对路径，或解析后落在存储根目录之外
    #[error("非法的文件句柄: {handle}")]
    InvalidHandle { handle: String },
    /// 句柄合法但文件不存在
    #[error("文件不存在: {handle}")]
    NotFound { handle: String },
    /// 写入结果表格失败
    #[error("写入表格失败 ({path}): {message}")]
    WriteFailed { path: String, message: String },
    /// 文件系统错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<chromiumoxide::error::CdpError> for SessionError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        SessionError::InteractionError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for StoreError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        StoreError::WriteFailed {
            path: String::new(),
            message: err.to_string(),
        }
    }
}

// ========== 便捷构造函数 ==========

impl IngestError {
    /// 创建缺少列错误
    pub fn missing_column(column: impl Into<String>) -> Self {
        IngestError::MissingColumn {
            column: column.into(),
        }
    }

    /// 创建表格解析错误
    pub fn spreadsheet(path: impl Into<String>, message: impl ToString) -> Self {
        IngestError::Spreadsheet {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// 创建文档解析错误
    pub fn document(path: impl Into<String>, message: impl ToString) -> Self {
        IngestError::Document {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

impl SessionError {
    /// 创建超时错误
    pub fn timeout(locator: impl ToString, timeout: Duration) -> Self {
        SessionError::InteractionTimeout {
            locator: locator.to_string(),
            timeout,
        }
    }

    /// 创建交互错误
    pub fn interaction(message: impl Into<String>) -> Self {
        SessionError::InteractionError(message.into())
    }
}

impl StoreError {
    pub fn invalid_handle(handle: impl Into<String>) -> Self {
        StoreError::InvalidHandle {
            handle: handle.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
