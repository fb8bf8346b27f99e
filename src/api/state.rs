use std::sync::Arc;

use crate::browser::SessionFactory;
use crate::config::Config;
use crate::error::AppResult;
use crate::orchestrator::BatchOrchestrator;
use crate::services::FileStore;

/// 共享的应用状态
pub struct AppState {
    config: Config,
    uploads: FileStore,
    results: FileStore,
    orchestrator: Arc<BatchOrchestrator>,
}

impl AppState {
    /// 创建状态，并确保上传目录和结果目录存在
    pub fn new(config: Config, factory: Arc<dyn SessionFactory>) -> AppResult<Self> {
        let uploads = FileStore::new(&config.upload_dir);
        let results = FileStore::new(&config.result_dir);
        uploads.ensure_root()?;
        results.ensure_root()?;

        let orchestrator = Arc::new(BatchOrchestrator::new(
            factory,
            results.clone(),
            config.form_urls.clone(),
        ));

        Ok(Self {
            config,
            uploads,
            results,
            orchestrator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uploads(&self) -> &FileStore {
        &self.uploads
    }

    pub fn results(&self) -> &FileStore {
        &self.results
    }

    pub fn orchestrator(&self) -> Arc<BatchOrchestrator> {
        Arc::clone(&self.orchestrator)
    }
}
