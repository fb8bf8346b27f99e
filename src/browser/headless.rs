use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info};

use crate::browser::session::{Locator, SessionClient, SessionFactory};
use crate::config::Config;
use crate::error::SessionError;

/// 等待元素时的轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// 无头浏览器会话工厂：每次 `open` 启动一个独立的浏览器进程
#[derive(Debug, Clone)]
pub struct ChromeSessionFactory {
    executable: Option<PathBuf>,
    headless: bool,
}

impl ChromeSessionFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            executable: config.chrome_executable.clone(),
            headless: config.headless,
        }
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> Result<Box<dyn SessionClient>, SessionError> {
        let session = ChromeSession::launch(self.executable.as_ref(), self.headless).await?;
        Ok(Box::new(session))
    }
}

/// 基于 chromiumoxide 的会话
///
/// 持有唯一的 Page，整个批次复用。
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// 启动浏览器并打开空白页面
    pub async fn launch(executable: Option<&PathBuf>, headless: bool) -> Result<Self, SessionError> {
        info!("🚀 启动浏览器 (headless: {})...", headless);

        let mut builder = BrowserConfig::builder();
        builder = if headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(path) = executable {
            debug!("浏览器路径: {}", path.display());
            builder = builder.chrome_executable(path);
        }

        let config = builder
            .args(vec![
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
            ])
            .build()
            .map_err(|e| {
                error!("配置浏览器失败: {}", e);
                SessionError::LaunchFailed(e)
            })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            SessionError::LaunchFailed(e.to_string())
        })?;

        // 在后台处理浏览器事件
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        let page = browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            SessionError::LaunchFailed(e.to_string())
        })?;

        info!("✅ 浏览器已就绪");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    async fn find(&self, locator: Locator) -> Result<Element, CdpError> {
        match locator.css() {
            Some(css) => self.page.find_element(css).await,
            None => self.page.find_xpath(xpath_of(locator)).await,
        }
    }

    async fn find_all(&self, locator: Locator) -> Result<Vec<Element>, CdpError> {
        match locator.css() {
            Some(css) => self.page.find_elements(css).await,
            None => self.page.find_xpaths(xpath_of(locator)).await,
        }
    }

    /// 轮询直到元素出现或超时
    async fn wait_for(&self, locator: Locator, timeout: Duration) -> Result<Element, SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = self.find(locator).await {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(SessionError::timeout(locator, timeout));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn element_text(element: &Element) -> Result<String, SessionError> {
        Ok(element.inner_text().await?.unwrap_or_default())
    }
}

fn xpath_of(locator: Locator) -> &'static str {
    match locator {
        Locator::XPath(xpath) => xpath,
        Locator::Id(s) | Locator::Class(s) => s,
    }
}

#[async_trait]
impl SessionClient for ChromeSession {
    fn name(&self) -> &str {
        "chromium"
    }

    async fn navigate(&mut self, address: &str) -> Result<(), SessionError> {
        debug!("导航到: {}", address);
        self.page
            .goto(address)
            .await
            .map_err(|e| SessionError::interaction(format!("导航到 {} 失败: {}", address, e)))?;
        Ok(())
    }

    async fn fill(&mut self, field: Locator, value: &str) -> Result<(), SessionError> {
        let element = self
            .find(field)
            .await
            .map_err(|e| SessionError::interaction(format!("找不到输入框 {}: {}", field, e)))?;
        element.click().await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn activate(&mut self, control: Locator) -> Result<(), SessionError> {
        let element = self
            .find(control)
            .await
            .map_err(|e| SessionError::interaction(format!("找不到控件 {}: {}", control, e)))?;
        element.click().await?;
        Ok(())
    }

    async fn wait_for_text(
        &mut self,
        locator: Locator,
        timeout: Duration,
    ) -> Result<String, SessionError> {
        let element = self.wait_for(locator, timeout).await?;
        Self::element_text(&element).await
    }

    async fn wait_for_all_text(
        &mut self,
        locator: Locator,
        timeout: Duration,
    ) -> Result<Vec<String>, SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(elements) = self.find_all(locator).await {
                if !elements.is_empty() {
                    let mut texts = Vec::with_capacity(elements.len());
                    for element in &elements {
                        texts.push(Self::element_text(element).await?);
                    }
                    return Ok(texts);
                }
            }
            if Instant::now() >= deadline {
                return Err(SessionError::timeout(locator, timeout));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        info!("🔒 关闭浏览器...");
        let result = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler.abort();
        result.map(|_| ()).map_err(SessionError::from)
    }
}
