//! 会话能力接口
//!
//! 编排层只认识 `SessionClient`：打开地址、填写输入框、点击控件、等待元素文本。
//! 具体用哪种浏览器驱动由 `SessionFactory` 决定（真实浏览器或测试替身）。

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::SessionError;

/// 元素定位方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Locator {
    /// 元素 id
    Id(&'static str),
    /// CSS class
    Class(&'static str),
    /// XPath 表达式
    XPath(&'static str),
}

impl Locator {
    /// 转换为 CSS 选择器（XPath 返回 None）
    pub fn css(self) -> Option<String> {
        match self {
            Locator::Id(id) => Some(format!("#{}", id)),
            Locator::Class(class) => Some(format!(".{}", class)),
            Locator::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Class(class) => write!(f, ".{}", class),
            Locator::XPath(xpath) => write!(f, "xpath:{}", xpath),
        }
    }
}

/// 一个有状态的外部交互会话
///
/// 会话不能并发使用：同一时间只有一个交互在进行。
#[async_trait]
pub trait SessionClient: Send {
    /// 实现名称（用于日志）
    fn name(&self) -> &str;

    /// 打开目标地址，重置表单状态
    async fn navigate(&mut self, address: &str) -> Result<(), SessionError>;

    /// 向输入框追加文本
    async fn fill(&mut self, field: Locator, value: &str) -> Result<(), SessionError>;

    /// 点击控件
    async fn activate(&mut self, control: Locator) -> Result<(), SessionError>;

    /// 最多等待 `timeout`，直到匹配的元素出现，返回其文本
    async fn wait_for_text(&mut self, locator: Locator, timeout: Duration)
        -> Result<String, SessionError>;

    /// 最多等待 `timeout`，直到至少一个匹配的元素出现，按文档顺序返回全部文本
    async fn wait_for_all_text(
        &mut self,
        locator: Locator,
        timeout: Duration,
    ) -> Result<Vec<String>, SessionError>;

    /// 关闭会话，释放底层资源
    async fn close(&mut self) -> Result<(), SessionError>;
}

/// 会话工厂：每个批次打开一个新会话
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn SessionClient>, SessionError>;
}

/// 会话的作用域守卫
///
/// 正常路径通过 `release()` 显式关闭；如果守卫在未释放的情况下被丢弃
/// （panic 展开、任务被取消），会在后台关闭会话。无论哪条路径，会话只关闭一次。
pub struct SessionGuard {
    session: Option<Box<dyn SessionClient>>,
}

impl SessionGuard {
    /// 通过工厂打开会话
    pub async fn acquire(factory: &dyn SessionFactory) -> Result<Self, SessionError> {
        let session = factory.open().await?;
        debug!("会话已打开: {}", session.name());
        Ok(Self {
            session: Some(session),
        })
    }

    /// 获取会话；守卫释放后不可再用
    pub fn session(&mut self) -> Result<&mut dyn SessionClient, SessionError> {
        match self.session.as_deref_mut() {
            Some(session) => Ok(session),
            None => Err(SessionError::interaction("会话已释放")),
        }
    }

    /// 显式关闭会话
    pub async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            match session.close().await {
                Ok(()) => debug!("会话已关闭: {}", session.name()),
                Err(e) => warn!("⚠️ 关闭会话失败: {}", e),
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            warn!("⚠️ 会话未显式释放，转入后台关闭");
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        if let Err(e) = session.close().await {
                            warn!("⚠️ 后台关闭会话失败: {}", e);
                        }
                    });
                }
                Err(_) => warn!("⚠️ 当前没有 tokio 运行时，会话随进程回收"),
            }
        }
    }
}
