//! 批量查询处理器 - 编排层
//!
//! ## 职责
//!
//! 一个批次 = 一个上传文件 + 一种查询类型。本模块负责批次的完整生命周期。
//!
//! ## 状态机
//!
//! ```text
//! Initializing → Streaming(i) → Finalizing → Done
//! ```
//!
//! 1. **Initializing**：导入文件、发送 `{total}`、打开会话（没有记录时不打开）
//! 2. **Streaming(i)**：逐条记录查询，每条记录发送一个进度事件
//! 3. **Finalizing**：关闭会话、合并结果、写入结果表格
//! 4. **Done**：发送携带下载句柄的终止事件
//!
//! ## 设计特点
//!
//! - **严格顺序**：同一批次内记录逐条处理，会话不并发使用
//! - **失败吸收**：单条记录的交互失败变成占位结果，批次不中断
//! - **资源独占**：每个批次打开自己的会话，并且只关闭一次

use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{error, warn};

use crate::browser::{SessionFactory, SessionGuard};
use crate::config::FormUrls;
use crate::error::{AppError, AppResult};
use crate::ingest::{self, ColumnBindings};
use crate::models::{
    Counters, LookupKind, LookupOutcome, OutcomeKind, OutcomeValue, ProgressEvent, RecordEvent,
};
use crate::orchestrator::progress::ProgressSender;
use crate::orchestrator::strategy::LookupStrategy;
use crate::services::{merge_outcomes, write_xlsx, FileStore};
use crate::utils::logging::{log_batch_complete, log_batch_start};
use crate::workflow::RecordCtx;

/// 下载接口路径，终止事件中的 `download` 字段以此为前缀
pub const DOWNLOAD_PATH: &str = "/api/results/download";

/// 一次批处理请求
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub kind: LookupKind,
    /// 已保存的上传文件
    pub input: PathBuf,
    /// 客户端指定的列绑定
    pub bindings: ColumnBindings,
}

/// 批次统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSummary {
    pub kind: LookupKind,
    pub total: usize,
    pub processed: usize,
    /// 单值模式下的分类计数
    pub counters: Option<Counters>,
    /// 结果文件句柄
    pub handle: String,
}

/// 运行中的计数
#[derive(Debug, Clone)]
struct Tally {
    processed: usize,
    counters: Option<Counters>,
}

impl Tally {
    fn new(classified: bool) -> Self {
        Self {
            processed: 0,
            counters: classified.then(Counters::default),
        }
    }

    fn record(&mut self, value: &OutcomeValue) {
        self.processed += 1;
        if let (Some(counters), OutcomeValue::Classified { kind, .. }) = (&mut self.counters, value) {
            match kind {
                OutcomeKind::Found => counters.found += 1,
                OutcomeKind::NotFound => counters.not_found += 1,
                OutcomeKind::Error => counters.error_count += 1,
            }
        }
    }
}

/// 批量查询处理器
///
/// 持有会话工厂和结果仓库，可以被多个批次共享；每次 `run` 相互独立。
pub struct BatchOrchestrator {
    factory: Arc<dyn SessionFactory>,
    results: FileStore,
    form_urls: FormUrls,
}

impl BatchOrchestrator {
    pub fn new(factory: Arc<dyn SessionFactory>, results: FileStore, form_urls: FormUrls) -> Self {
        Self {
            factory,
            results,
            form_urls,
        }
    }

    /// 执行一个批次
    ///
    /// 无论成功与否，`progress` 上最后一个事件一定是终止事件。
    pub async fn run(&self, request: BatchRequest, mut progress: ProgressSender) -> AppResult<BatchSummary> {
        let result = self.execute(request, &mut progress).await;
        if let Err(e) = &result {
            error!("❌ 批次失败: {}", e);
            if !progress.is_finished() {
                progress.fail(e);
            }
        }
        result
    }

    async fn execute(&self, request: BatchRequest, progress: &mut ProgressSender) -> AppResult<BatchSummary> {
        // ========== Initializing ==========
        let strategy = LookupStrategy::for_kind(request.kind, &self.form_urls)?;
        let bindings = strategy.resolve_bindings(request.bindings);

        let input = request.input.clone();
        let required = strategy.required_roles();
        let document_columns = strategy.document_columns.clone();
        let ingested = tokio::task::spawn_blocking(move || {
            ingest::ingest(&input, &required, &document_columns, &bindings)
        })
        .await
        .map_err(|e| AppError::Config(format!("导入任务失败: {}", e)))??;

        let total = ingested.total();
        log_batch_start(strategy.kind, total);
        progress.emit(ProgressEvent::Started { total });

        // 没有记录时不启动浏览器
        let mut guard = match total {
            0 => None,
            _ => Some(SessionGuard::acquire(self.factory.as_ref()).await?),
        };

        // ========== Streaming ==========
        let flow = &strategy.flow;
        let mut tally = Tally::new(flow.is_classified());
        let mut outcomes = Vec::with_capacity(total);

        if let Some(guard) = guard.as_mut() {
            for (sequence, record) in ingested.records().iter().enumerate() {
                let ctx = RecordCtx::new(strategy.kind, sequence + 1, total);
                let lookup = flow.build_request(record, &ingested.bindings);

                let value = match guard.session() {
                    Ok(session) => flow.run(session, &lookup, &ctx).await,
                    Err(e) => flow.placeholder(&e),
                };
                tally.record(&value);

                let mut fields: IndexMap<String, String> = flow.echo(&lookup);
                fields.extend(strategy.output.derive(&value));
                progress.emit(ProgressEvent::Record(RecordEvent {
                    fields,
                    processed: tally.processed,
                    total,
                    counters: tally.counters,
                }));

                outcomes.push(LookupOutcome {
                    key: lookup.key,
                    sequence,
                    value,
                });
            }
        }

        // ========== Finalizing ==========
        if let Some(guard) = guard {
            guard.release().await;
        }

        let key_column = strategy.key_column(&ingested.bindings).unwrap_or_default();
        let merged = merge_outcomes(&ingested.table, key_column, &outcomes, &strategy.output);

        let handle = self.results.new_result_handle();
        let path = self.results.path_for(&handle);
        tokio::task::spawn_blocking(move || write_xlsx(&merged, &path))
            .await
            .map_err(|e| AppError::Config(format!("写入任务失败: {}", e)))??;

        // ========== Done ==========
        progress.emit(ProgressEvent::Completed {
            download: format!("{}?file={}", DOWNLOAD_PATH, handle),
            file: handle.clone(),
            total,
            processed: tally.processed,
            counters: tally.counters,
        });

        if tally.processed != total {
            warn!("⚠️ 已处理数量 {} 与总数 {} 不一致", tally.processed, total);
        }
        log_batch_complete(strategy.kind, tally.processed, tally.counters.as_ref(), Some(&handle));

        Ok(BatchSummary {
            kind: strategy.kind,
            total,
            processed: tally.processed,
            counters: tally.counters,
            handle,
        })
    }
}
