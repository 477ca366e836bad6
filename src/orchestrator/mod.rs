//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用主结构
//! - 创建登记服务客户端和断点存储
//! - 启动检查（服务器、花名册、可用人员）
//! - 输出人员统计、最终统计和 JSON 报告
//!
//! ### `batch_runner` - 批量登记处理器
//! - 按输入顺序逐个处理请求
//! - 累计 RunStatistics
//! - 请求之间检查停止标记
//!
//! ### `progress` - 进度事件
//! - 每个请求处理后发送一次，结束时发送汇总
//! - 发送不阻塞，可以丢弃
//!
//! ## 层次关系
//!
//! ```text
//! app (启动检查 / 报告)
//!     ↓
//! batch_runner (处理 Vec<RegistrationRequest>)
//!     ↓
//! workflow::RegistrationOrchestrator (处理单个请求)
//!     ↓
//! services (能力层：人员分配 / 断点存储 / 失败分类)
//!     ↓
//! clients (远程登记服务)
//! ```

pub mod app;
pub mod batch_runner;
pub mod progress;

// 重新导出主要类型
pub use app::{App, RolePersonnel, StatusSummary};
pub use batch_runner::{BatchRunner, FailedRequest, RunStatistics, StopHandle};
pub use progress::{spawn_progress_logger, ProgressEvent, ProgressSender};
