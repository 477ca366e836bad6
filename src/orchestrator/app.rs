//! 应用主结构 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：创建登记服务客户端和断点存储
//! 2. **启动检查**：服务器可达、花名册同步、每个角色至少有一个可用人员
//! 3. **批量登记**：委托 BatchRunner 逐个处理
//! 4. **结果输出**：运行前后的人员统计、最终统计、JSON 报告

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::{info, warn};

use crate::clients::{HttpRegistryClient, RemoteRegistry};
use crate::config::Config;
use crate::models::personnel::Role;
use crate::models::registry::date_code;
use crate::models::{load_requests, RegistrationRequest};
use crate::orchestrator::batch_runner::{BatchRunner, RunStatistics, StopHandle};
use crate::orchestrator::progress::spawn_progress_logger;
use crate::services::{
    CheckpointStore, CompletionLedger, PersonnelAllocator, ReportWriter, RoleStats,
};
use crate::utils::logging;
use crate::workflow::{RegistrationOrchestrator, RegistrationSettings};

/// 进度日志间隔
const PROGRESS_LOG_EVERY: usize = 10;

/// 应用主结构
pub struct App {
    config: Config,
    registry: Arc<dyn RemoteRegistry>,
    store: Arc<CheckpointStore>,
}

/// 某角色的人员统计（报告用）
#[derive(Debug, Clone, Serialize)]
pub struct RolePersonnel {
    pub role: Role,
    #[serde(flatten)]
    pub stats: RoleStats,
}

/// 运行报告
#[derive(Debug, Serialize)]
struct RunReport<'a> {
    timestamp: String,
    statistics: &'a RunStatistics,
    personnel: Vec<RolePersonnel>,
    config: Config,
}

/// 状态查询结果
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub completed: usize,
    pub personnel: Vec<RolePersonnel>,
}

impl App {
    /// 使用 HTTP 客户端初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let client = HttpRegistryClient::new(&config).context("创建登记服务客户端失败")?;
        Ok(Self::with_registry(config, Arc::new(client)))
    }

    /// 使用指定的登记服务实现
    pub fn with_registry(config: Config, registry: Arc<dyn RemoteRegistry>) -> Self {
        let store = Arc::new(CheckpointStore::from_config(&config));
        Self {
            config,
            registry,
            store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行应用主逻辑
    pub async fn run(&self, stop: StopHandle) -> Result<RunStatistics> {
        logging::log_startup(&self.config.api.base_url, self.config.retry.max_attempts);

        let requests = self.load_requests().await?;

        // 断点文件损坏属于致命错误，在处理任何请求之前退出
        let ledger = CompletionLedger::load(self.store.clone()).context("加载成功名单失败")?;
        let mut allocator = PersonnelAllocator::from_config(self.store.clone(), &self.config)
            .context("加载人员计数失败")?;

        let already_done = requests.iter().filter(|r| ledger.contains(r.id())).count();
        logging::log_requests_loaded(requests.len(), already_done);

        if requests.is_empty() {
            warn!("⚠️ 入住表中没有可登记的用户，程序结束");
            return Ok(RunStatistics::default());
        }

        self.preflight(&mut allocator).await?;
        logging::log_personnel_stats("运行前人员统计", &personnel_stats(&allocator));

        let orchestrator = RegistrationOrchestrator::new(
            self.registry.clone(),
            allocator,
            ledger,
            RegistrationSettings::from_config(&self.config),
        );
        let mut runner = BatchRunner::new(orchestrator).with_stop_handle(stop);

        let progress_logger =
            spawn_progress_logger(runner.progress().subscribe(), PROGRESS_LOG_EVERY);
        let stats = runner.run(&requests).await;
        if let Err(e) = progress_logger.await {
            warn!("进度日志任务异常退出: {}", e);
        }

        let personnel = personnel_stats(runner.orchestrator().allocator());
        logging::log_personnel_stats("运行后人员统计", &personnel);
        logging::print_final_stats(&stats, self.error_log_path().as_deref());

        if let Err(e) = self.write_report(&stats, personnel).await {
            warn!("⚠️ 导出报告失败: {:#}", e);
        }

        Ok(stats)
    }

    /// 只读取本地断点，输出成功名单和人员统计
    pub fn status(&self) -> Result<StatusSummary> {
        let ledger = CompletionLedger::load(self.store.clone()).context("加载成功名单失败")?;
        let allocator = PersonnelAllocator::from_config(self.store.clone(), &self.config)
            .context("加载人员计数失败")?;

        let personnel = personnel_stats(&allocator);
        info!("✓ 成功名单: {} 人", ledger.len());
        logging::log_personnel_stats("当前人员统计", &personnel);

        Ok(StatusSummary {
            completed: ledger.len(),
            personnel: personnel
                .into_iter()
                .map(|(role, stats)| RolePersonnel { role, stats })
                .collect(),
        })
    }

    async fn load_requests(&self) -> Result<Vec<RegistrationRequest>> {
        info!("\n📁 正在读取入住表...");
        let path = self.config.resolve(&self.config.files.requests_file);
        load_requests(&path)
            .await
            .with_context(|| format!("读取入住表失败: {}", path.display()))
    }

    /// 启动检查
    ///
    /// 服务器不可达、花名册获取失败或某角色没有可用人员时直接退出。
    async fn preflight(&self, allocator: &mut PersonnelAllocator) -> Result<()> {
        info!("🔍 启动检查...");

        let date = self
            .registry
            .server_date()
            .await
            .context("登记服务不可用")?;
        info!("✓ 登记服务正常，服务器日期: {}", date_code(date));

        let roster = self
            .registry
            .list_personnel(&self.config.api.org_code)
            .await
            .context("获取人员花名册失败")?;
        info!("✓ 花名册共 {} 人", roster.len());

        allocator
            .sync_from_roster(&roster, &self.config.personnel.specific_caregivers)
            .context("保存人员计数失败")?;

        for role in Role::ALL {
            if allocator.stats(role).available == 0 {
                bail!("没有可用的{}，请检查花名册和上限配置", role);
            }
        }

        info!("✓ 启动检查通过");
        Ok(())
    }

    async fn write_report(
        &self,
        stats: &RunStatistics,
        personnel: Vec<(Role, RoleStats)>,
    ) -> Result<PathBuf> {
        let mut config = self.config.clone();
        if !config.api.token.is_empty() {
            config.api.token = "***".to_string();
        }

        let report = RunReport {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            statistics: stats,
            personnel: personnel
                .into_iter()
                .map(|(role, stats)| RolePersonnel { role, stats })
                .collect(),
            config,
        };

        ReportWriter::new(self.config.resolve(&self.config.files.report_dir))
            .write(&report)
            .await
    }

    /// 错误日志路径（未启用文件日志时为 None）
    pub fn error_log_path(&self) -> Option<PathBuf> {
        self.config
            .logging
            .enable_file
            .then(|| self.config.resolve(&self.config.files.error_log))
    }
}

fn personnel_stats(allocator: &PersonnelAllocator) -> Vec<(Role, RoleStats)> {
    Role::ALL
        .into_iter()
        .map(|role| (role, allocator.stats(role)))
        .collect()
}
