//! 基础设施层：持有浏览器资源，只暴露会话能力

pub mod headless;
pub mod session;

pub use headless::{ChromeSession, ChromeSessionFactory};
pub use session::{Locator, SessionClient, SessionFactory, SessionGuard};
