/// 日志工具模块
///
/// 提供日志初始化和批次生命周期的输出辅助函数
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::models::{Counters, LookupKind};
use crate::workflow::RecordCtx;

/// 默认日志过滤规则（可被 `RUST_LOG` 覆盖）
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// 初始化全局日志订阅器
///
/// 重复调用时忽略（测试中多次初始化不会 panic）
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 生效的配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 批量查询服务启动 - v{}", env!("CARGO_PKG_VERSION"));
    info!("🌐 监听地址: {}", config.bind_addr);
    info!("📂 上传目录: {} | 结果目录: {}", config.upload_dir.display(), config.result_dir.display());
    info!(
        "🧭 浏览器: {} ({})",
        config
            .chrome_executable
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "自动查找".to_string()),
        if config.headless { "无头" } else { "有界面" }
    );
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `kind`: 查询类型
/// - `total`: 记录总数
pub fn log_batch_start(kind: LookupKind, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📦 开始批次 [{}] - {}",
        kind,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📄 共 {} 条记录，逐条查询", total);
    info!("{}", "=".repeat(60));
}

/// 记录单条查询开始
///
/// # 参数
/// - `ctx`: 记录上下文
/// - `key`: 关键字段值
pub fn log_record_start(ctx: &RecordCtx, key: &str) {
    debug!("{} ▶ 查询: {}", ctx, truncate_text(key, 40));
}

/// 记录批次完成信息
///
/// # 参数
/// - `kind`: 查询类型
/// - `processed`: 已处理数量
/// - `counters`: 单值模式下的分类计数
/// - `handle`: 结果文件句柄
pub fn log_batch_complete(
    kind: LookupKind,
    processed: usize,
    counters: Option<&Counters>,
    handle: Option<&str>,
) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 批次 [{}] 完成: 已处理 {} 条", kind, processed);
    if let Some(c) = counters {
        info!(
            "✅ 找到: {} | ❓ 未找到: {} | ❌ 出错: {}",
            c.found, c.not_found, c.error_count
        );
    }
    match handle {
        Some(handle) => info!("💾 结果文件: {}", handle),
        None => info!("💾 未生成结果文件"),
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
