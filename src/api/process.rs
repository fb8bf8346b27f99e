use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use serde::Deserialize;
use tracing::{debug, info};

use super::handlers::ApiError;
use super::state::AppState;
use crate::error::StoreError;
use crate::ingest::ColumnBindings;
use crate::models::{FieldRole, LookupKind, ProgressEvent};
use crate::orchestrator::{channel, BatchRequest};

/// 处理请求参数：上传文件的存储名 + 各角色对应的列名
#[derive(Debug, Deserialize)]
pub struct ProcessQuery {
    pub file: String,
    pub name_col: Option<String>,
    pub father_col: Option<String>,
    pub mobile_col: Option<String>,
    pub user_col: Option<String>,
    pub roll_col: Option<String>,
}

impl ProcessQuery {
    pub fn bindings(&self) -> ColumnBindings {
        let mut bindings = ColumnBindings::new();
        let pairs = [
            (FieldRole::Name, &self.name_col),
            (FieldRole::Father, &self.father_col),
            (FieldRole::Mobile, &self.mobile_col),
            (FieldRole::UserId, &self.user_col),
            (FieldRole::Roll, &self.roll_col),
        ];
        for (role, column) in pairs {
            if let Some(column) = column {
                bindings.bind(role, column.as_str());
            }
        }
        bindings
    }
}

/// GET /api/{kind}/process
///
/// 非法句柄在打开流之前以 403 拒绝；其余错误（文件缺失、导入失败）
/// 以流中唯一的错误事件报告。
pub async fn process(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<LookupKind>,
    Query(params): Query<ProcessQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let input = match state.uploads().resolve(&params.file) {
        Ok(path) => path,
        Err(StoreError::NotFound { .. }) => state.uploads().path_for(params.file.trim()),
        Err(e) => return Err(e.into()),
    };

    let (sender, receiver) = channel();
    let request = BatchRequest {
        kind,
        input,
        bindings: params.bindings(),
    };

    let orchestrator = state.orchestrator();
    tokio::spawn(async move {
        match orchestrator.run(request, sender).await {
            Ok(summary) => info!(
                "[{}] 批次结束: {}/{} → {}",
                summary.kind, summary.processed, summary.total, summary.handle
            ),
            Err(e) => debug!("[{}] 批次未完成: {}", kind, e),
        }
    });

    let events = stream::unfold(receiver, |mut rx| async move {
        let event = rx.recv().await?;
        Some((Ok::<_, Infallible>(to_sse_event(&event)), rx))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &ProgressEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        Event::default().data(format!("{{\"error\":\"无法序列化事件: {}\"}}", e))
    })
}
