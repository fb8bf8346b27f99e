//! 进度发送端
//!
//! 包装 `mpsc::UnboundedSender<ProgressEvent>`：
//! - 发送从不阻塞，订阅者不读取也不会拖住批次（一个批次最多 N+2 个事件）
//! - 终止事件之后的任何事件都会被丢弃
//! - 客户端断开后批次继续执行，只记录一次日志

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::ProgressEvent;

/// 创建一对进度通道
pub fn channel() -> (ProgressSender, mpsc::UnboundedReceiver<ProgressEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender::new(tx), rx)
}

#[derive(Debug)]
pub struct ProgressSender {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
    finished: bool,
}

impl ProgressSender {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            tx: Some(tx),
            finished: false,
        }
    }

    /// 是否已发送终止事件
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn emit(&mut self, event: ProgressEvent) {
        if self.finished {
            warn!("⚠️ 批次已结束，丢弃事件: {:?}", event);
            return;
        }
        self.finished = event.is_terminal();

        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                info!("客户端已断开，批次继续执行");
                self.tx = None;
            }
        }
    }

    /// 发送错误终止事件
    pub fn fail(&mut self, error: impl ToString) {
        self.emit(ProgressEvent::Failed {
            error: error.to_string(),
        });
    }
}
