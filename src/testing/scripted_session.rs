//! 按脚本应答的会话替身

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{Locator, SessionClient, SessionFactory};
use crate::error::SessionError;

/// 一次等待调用的脚本应答
#[derive(Debug, Clone)]
pub enum Scripted {
    /// 单个元素文本
    Text(String),
    /// 多个元素文本
    Texts(Vec<String>),
    /// 交互失败
    Fail(SessionError),
}

impl Scripted {
    pub fn text(text: impl Into<String>) -> Self {
        Scripted::Text(text.into())
    }

    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Scripted::Texts(texts.into_iter().map(Into::into).collect())
    }

    pub fn timeout(locator: Locator) -> Self {
        Scripted::Fail(SessionError::timeout(locator, Duration::from_secs(10)))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Scripted::Fail(SessionError::interaction(message))
    }
}

/// 记录下来的会话调用，用于断言
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    Navigate(String),
    Fill(Locator, String),
    Activate(Locator),
    WaitText(Locator),
    WaitAllText(Locator),
    Close,
}

#[derive(Debug, Default)]
struct ScriptState {
    responses: HashMap<Locator, VecDeque<Scripted>>,
    calls: Vec<RecordedCall>,
    open_error: Option<SessionError>,
    opened: usize,
    closed: usize,
}

/// 脚本化会话工厂
///
/// 对某个定位器的等待调用按顺序弹出预设应答；没有预设的定位器视为
/// "元素已出现但文本为空"。所有打开的会话共享同一份调用记录。
///
/// ```rust,ignore
/// let factory = ScriptedSessionFactory::new().respond(
///     Locator::Class("red12bold"),
///     [Scripted::text("ABCDEFGHIJ"), Scripted::error("connection reset")],
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedSessionFactory {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为某个定位器追加应答
    pub fn respond<I>(self, locator: Locator, responses: I) -> Self
    where
        I: IntoIterator<Item = Scripted>,
    {
        self.lock()
            .responses
            .entry(locator)
            .or_default()
            .extend(responses);
        self
    }

    /// 让 `open` 失败
    pub fn fail_open(self, error: SessionError) -> Self {
        self.lock().open_error = Some(error);
        self
    }

    /// 打开过的会话数量
    pub fn opened(&self) -> usize {
        self.lock().opened
    }

    /// 关闭调用次数
    pub fn closed(&self) -> usize {
        self.lock().closed
    }

    /// 全部调用记录
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// 导航次数
    pub fn navigations(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, RecordedCall::Navigate(_)))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SessionFactory for ScriptedSessionFactory {
    async fn open(&self) -> Result<Box<dyn SessionClient>, SessionError> {
        let mut state = self.lock();
        if let Some(error) = state.open_error.clone() {
            return Err(error);
        }
        state.opened += 1;
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
        }))
    }
}

/// 脚本化会话
pub struct ScriptedSession {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedSession {
    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_response(&self, locator: Locator, call: RecordedCall) -> Option<Scripted> {
        let mut state = self.lock();
        state.calls.push(call);
        state.responses.get_mut(&locator).and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl SessionClient for ScriptedSession {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn navigate(&mut self, address: &str) -> Result<(), SessionError> {
        self.lock().calls.push(RecordedCall::Navigate(address.to_string()));
        Ok(())
    }

    async fn fill(&mut self, field: Locator, value: &str) -> Result<(), SessionError> {
        self.lock()
            .calls
            .push(RecordedCall::Fill(field, value.to_string()));
        Ok(())
    }

    async fn activate(&mut self, control: Locator) -> Result<(), SessionError> {
        self.lock().calls.push(RecordedCall::Activate(control));
        Ok(())
    }

    async fn wait_for_text(
        &mut self,
        locator: Locator,
        _timeout: Duration,
    ) -> Result<String, SessionError> {
        match self.next_response(locator, RecordedCall::WaitText(locator)) {
            None => Ok(String::new()),
            Some(Scripted::Text(text)) => Ok(text),
            Some(Scripted::Texts(texts)) => Ok(texts.into_iter().next().unwrap_or_default()),
            Some(Scripted::Fail(error)) => Err(error),
        }
    }

    async fn wait_for_all_text(
        &mut self,
        locator: Locator,
        _timeout: Duration,
    ) -> Result<Vec<String>, SessionError> {
        match self.next_response(locator, RecordedCall::WaitAllText(locator)) {
            None => Ok(Vec::new()),
            Some(Scripted::Text(text)) => Ok(vec![text]),
            Some(Scripted::Texts(texts)) => Ok(texts),
            Some(Scripted::Fail(error)) => Err(error),
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall::Close);
        state.closed += 1;
        Ok(())
    }
}
