use std::sync::Arc;

use anyhow::{Context, Result};
use result_lookup::utils::logging;
use result_lookup::{create_router, AppState, ChromeSessionFactory, Config};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::load().context("加载配置失败")?;
    logging::log_startup(&config);

    // 初始化应用状态
    let factory = Arc::new(ChromeSessionFactory::new(&config));
    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, factory).context("初始化存储目录失败")?;
    let app = create_router(Arc::new(state));

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("无法监听 {}", bind_addr))?;
    info!("✓ 服务已启动: http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("服务器异常退出")?;

    info!("👋 服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("无法安装 Ctrl+C 处理器");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("无法安装 SIGTERM 处理器")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("收到关闭信号，正在停止...");
}
