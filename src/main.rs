use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use nursing_checkin_submit::orchestrator::{App, StopHandle};
use nursing_checkin_submit::utils::logging;
use nursing_checkin_submit::Config;

#[derive(Debug, Parser)]
#[command(name = "nursing_checkin_submit", version, about = "护理入住批量登记")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 批量登记（默认）
    Run,
    /// 查看成功名单和人员统计，不访问登记服务
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(&cli.config)
        .with_context(|| format!("加载配置文件失败: {}", cli.config.display()))?;

    // 初始化日志
    let app = App::initialize(config)?;
    logging::init(&app.config().logging.level, app.error_log_path().as_deref())?;

    if !cli.config.exists() {
        warn!("配置文件 {} 不存在，使用默认配置", cli.config.display());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let stop = StopHandle::new();
            let ctrl_c_stop = stop.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("收到 Ctrl-C，处理完当前用户后停止");
                    ctrl_c_stop.stop();
                }
            });

            let stats = app.run(stop).await?;
            info!("程序结束: 成功 {} / 共 {}", stats.succeeded, stats.total);
        }
        Commands::Status => {
            app.status()?;
        }
    }

    Ok(())
}
