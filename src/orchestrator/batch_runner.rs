//! 批量登记处理器 - 编排层
//!
//! 按输入顺序逐个处理请求，累计统计并在每个请求后发送进度事件。
//! 请求之间检查停止标记；正在进行的请求不会被打断。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::models::RegistrationRequest;
use crate::orchestrator::progress::{ProgressEvent, ProgressSender};
use crate::services::failure_classifier::FailureReason;
use crate::workflow::{RegistrationCtx, RegistrationOrchestrator, RegistrationOutcome};

/// 一个失败的请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRequest {
    pub identifier: String,
    pub reason: FailureReason,
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStatistics {
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<FailedRequest>,
    /// 是否被手动停止
    pub stopped: bool,
}

impl RunStatistics {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, identifier: &str, outcome: &RegistrationOutcome) {
        self.processed += 1;
        match outcome {
            RegistrationOutcome::Success(_) => self.succeeded += 1,
            RegistrationOutcome::Skipped => self.skipped += 1,
            RegistrationOutcome::Failed(reason) => {
                self.failed += 1;
                self.failures.push(FailedRequest {
                    identifier: identifier.to_string(),
                    reason: reason.clone(),
                });
            }
        }
    }

    /// 成功率（跳过的不计入分母）
    pub fn success_rate(&self) -> f64 {
        let attempted = self.succeeded + self.failed;
        if attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 * 100.0 / attempted as f64
        }
    }
}

/// 停止标记
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 批量登记处理器
pub struct BatchRunner {
    orchestrator: RegistrationOrchestrator,
    progress: ProgressSender,
    stop: StopHandle,
}

impl BatchRunner {
    pub fn new(orchestrator: RegistrationOrchestrator) -> Self {
        Self {
            orchestrator,
            progress: ProgressSender::new(),
            stop: StopHandle::new(),
        }
    }

    /// 使用外部的停止标记（例如 Ctrl-C 处理器持有的那一个）
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn progress(&self) -> &ProgressSender {
        &self.progress
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn orchestrator(&self) -> &RegistrationOrchestrator {
        &self.orchestrator
    }

    /// 按顺序处理所有请求
    pub async fn run(&mut self, requests: &[RegistrationRequest]) -> RunStatistics {
        let total = requests.len();
        let mut stats = RunStatistics::new(total);

        for (idx, request) in requests.iter().enumerate() {
            if self.stop.is_stopped() {
                warn!("⏹️ 收到停止信号，剩余 {} 个用户未处理", total - idx);
                stats.stopped = true;
                break;
            }

            let ctx = RegistrationCtx::new(idx + 1, total, request.name.clone());
            let outcome = self.orchestrator.process(request, &ctx).await;
            stats.record(request.id(), &outcome);

            self.progress.emit(ProgressEvent::Item {
                processed: idx + 1,
                total,
                identifier: request.id().to_string(),
                outcome,
                stats: stats.clone(),
            });
        }

        info!(
            "本批处理结束: 成功 {} | 跳过 {} | 失败 {} | 成功率 {:.1}%",
            stats.succeeded,
            stats.skipped,
            stats.failed,
            stats.success_rate()
        );

        self.progress.emit(ProgressEvent::Finished {
            stats: stats.clone(),
        });
        stats
    }
}
