/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::models::personnel::Role;
use crate::orchestrator::batch_runner::RunStatistics;
use crate::services::personnel_allocator::RoleStats;

/// 初始化日志系统
///
/// 控制台输出按 `RUST_LOG`（未设置时使用 `level`）过滤；
/// 传入 `error_log` 时，WARN 及以上的日志同时追加写入该文件。
pub fn init(level: &str, error_log: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_layer = match error_log {
        Some(path) => {
            let file = open_error_log(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(LevelFilter::WARN),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .with(file_layer)
        .try_init()
        .context("初始化日志系统失败")?;

    Ok(())
}

/// 打开错误日志文件并写入本次运行的分隔头
fn open_error_log(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("创建日志目录失败: {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开错误日志失败: {}", path.display()))?;

    let header = format!(
        "{}\n入住登记错误日志 - {}\n{}\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    file.write_all(header.as_bytes())
        .with_context(|| format!("写入错误日志失败: {}", path.display()))?;

    Ok(file)
}

/// 记录程序启动信息
pub fn log_startup(base_url: &str, max_attempts: u32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 护理入住批量登记");
    info!("🌐 登记服务: {}", base_url);
    info!("🔁 单个用户最多尝试: {} 次", max_attempts);
    info!("{}", "=".repeat(60));
}

/// 记录请求加载信息
pub fn log_requests_loaded(total: usize, already_done: usize) {
    info!("✓ 读取到 {} 个待登记用户", total);
    if already_done > 0 {
        info!("💡 成功名单中已有 {} 人，将自动跳过", already_done);
    }
}

/// 记录人员统计
pub fn log_personnel_stats(title: &str, stats: &[(Role, RoleStats)]) {
    info!("\n{}", "─".repeat(60));
    info!("👥 {}", title);
    for (role, s) in stats {
        info!(
            "  {}: 共 {} 人, 可用 {} 人, 已满 {} 人, 已用名额 {}/{}",
            role, s.total, s.available, s.exhausted, s.used_capacity, s.total_capacity
        );
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStatistics, error_log: Option<&Path>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.succeeded, stats.total);
    info!("⏭️ 跳过: {}", stats.skipped);
    info!("❌ 失败: {}", stats.failed);
    if stats.stopped {
        info!("⏹️ 已手动停止，处理了 {}/{}", stats.processed, stats.total);
    }
    for failure in &stats.failures {
        info!("  - {}: {}", failure.identifier, failure.reason);
    }
    info!("{}", "=".repeat(60));
    if let Some(path) = error_log {
        info!("\n错误日志已保存至: {}", path.display());
    }
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
