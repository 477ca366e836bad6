//! # Nursing Checkin Submit
//!
//! 护理入住登记批量提交工具
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 远程登记服务接口及其 HTTP 实现
//! - `RemoteRegistry` - 档案查询 / 服务器时间 / 护理分类 / 花名册 / 提交
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心流程
//! - `PersonnelAllocator` - 按负责人数最少分配人员
//! - `CheckpointStore` / `CompletionLedger` - 人员计数和成功名单的断点存储
//! - `failure_classifier` - 把服务端提示翻译成失败类型
//! - `ReportWriter` - 导出运行报告
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个用户"的完整登记流程
//! - `RegistrationCtx` - 上下文封装（序号 + 姓名）
//! - `RegistrationOrchestrator` - 流程编排（查询 → 分配 → 提交 → 确认）
//! - `retry_policy` - 失败后换人、等待重试还是放弃
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 启动检查、运行、报告
//! - `orchestrator/batch_runner` - 逐个处理请求，累计统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{HttpRegistryClient, RemoteRegistry};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{RegistrationRequest, Role};
pub use orchestrator::{App, BatchRunner, RunStatistics, StopHandle};
pub use services::{CheckpointStore, CompletionLedger, PersonnelAllocator};
pub use workflow::{RegistrationCtx, RegistrationOrchestrator, RegistrationOutcome};
