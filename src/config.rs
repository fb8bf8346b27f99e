use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::LookupKind;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP 监听地址
    pub bind_addr: String,
    /// 上传文件存放目录
    pub upload_dir: PathBuf,
    /// 结果表格存放目录
    pub result_dir: PathBuf,
    /// 浏览器可执行文件路径，不设置时由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,
    /// 是否使用无头模式
    pub headless: bool,
    /// 各查询类型的目标表单地址
    pub form_urls: FormUrls,
}

/// 各查询类型的目标表单地址
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FormUrls {
    pub mbbs_user_id: String,
    pub bds_user_id: String,
    pub mbbs_pass_recover: String,
    pub bds_pass_recover: String,
    pub mbbs_result: String,
    pub bds_result: String,
}

impl Default for FormUrls {
    fn default() -> Self {
        Self {
            mbbs_user_id: "http://dgme.teletalk.com.bd/mbbs/options/getinvoice.php".to_string(),
            bds_user_id: "http://dgme.teletalk.com.bd/bds/options/getinvoice.php".to_string(),
            mbbs_pass_recover: "http://dgme.teletalk.com.bd/mbbs/options/getpass.php".to_string(),
            bds_pass_recover: "http://dgme.teletalk.com.bd/bds/options/getpass.php".to_string(),
            mbbs_result: "https://result.dghs.gov.bd/mbbs/".to_string(),
            bds_result: "https://result.dghs.gov.bd/bds/".to_string(),
        }
    }
}

impl FormUrls {
    /// 获取指定查询类型的表单地址
    pub fn for_kind(&self, kind: LookupKind) -> &str {
        match kind {
            LookupKind::MbbsUserId => &self.mbbs_user_id,
            LookupKind::BdsUserId => &self.bds_user_id,
            LookupKind::MbbsPassRecover => &self.mbbs_pass_recover,
            LookupKind::BdsPassRecover => &self.bds_pass_recover,
            LookupKind::MbbsResult => &self.mbbs_result,
            LookupKind::BdsResult => &self.bds_result,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            result_dir: PathBuf::from("results"),
            chrome_executable: None,
            headless: true,
            form_urls: FormUrls::default(),
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（可选）→ 环境变量覆盖
    ///
    /// 文件路径取自 `LOOKUP_CONFIG`，默认为 `config.toml`，文件不存在时使用默认值。
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("LOOKUP_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        let base = if Path::new(&path).exists() {
            info!("📄 读取配置文件: {}", path);
            Self::from_toml_file(Path::new(&path))?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    /// 从 TOML 文件读取配置
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("无法读取 {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 从 TOML 文本解析配置，缺省字段使用默认值
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// 只读取环境变量（不读文件）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(self.bind_addr),
            upload_dir: std::env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(self.upload_dir),
            result_dir: std::env::var("RESULT_DIR").map(PathBuf::from).unwrap_or(self.result_dir),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().map(PathBuf::from).or(self.chrome_executable),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(self.headless),
            form_urls: self.form_urls,
        }
    }
}
