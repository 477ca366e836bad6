//! 进度事件
//!
//! 每处理完一个请求发送一次 `Item`，全部结束后发送一次 `Finished`。
//! 发送端不等待接收端，没有订阅者或订阅者落后时事件直接丢弃。

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::orchestrator::batch_runner::RunStatistics;
use crate::workflow::RegistrationOutcome;

const CHANNEL_CAPACITY: usize = 256;

/// 进度事件
#[derive(Debug, Clone, Serialize)]
pub enum ProgressEvent {
    /// 处理完一个请求
    Item {
        processed: usize,
        total: usize,
        identifier: String,
        outcome: RegistrationOutcome,
        stats: RunStatistics,
    },
    /// 本次运行结束
    Finished { stats: RunStatistics },
}

/// 进度事件发送端
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressSender {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// 发送事件，不关心是否有人接收
    pub fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::new()
    }
}

/// 启动进度日志任务：每 `every` 个请求输出一次进度，收到 `Finished` 后退出
pub fn spawn_progress_logger(
    mut rx: broadcast::Receiver<ProgressEvent>,
    every: usize,
) -> JoinHandle<()> {
    let every = every.max(1);
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ProgressEvent::Item {
                    processed,
                    total,
                    stats,
                    ..
                }) => {
                    if processed % every == 0 || processed == total {
                        info!(
                            "📊 进度: {}/{} ({:.1}%) | 成功 {} | 跳过 {} | 失败 {}",
                            processed,
                            total,
                            percent(processed, total),
                            stats.succeeded,
                            stats.skipped,
                            stats.failed
                        );
                    }
                }
                Ok(ProgressEvent::Finished { .. }) => break,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("进度日志落后，丢弃 {} 条事件", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn percent(processed: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        processed as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_is_ignored() {
        let progress = ProgressSender::new();
        progress.emit(ProgressEvent::Finished {
            stats: RunStatistics::default(),
        });
    }

    #[tokio::test]
    async fn test_logger_stops_on_finished() {
        let progress = ProgressSender::new();
        let handle = spawn_progress_logger(progress.subscribe(), 10);
        progress.emit(ProgressEvent::Finished {
            stats: RunStatistics::default(),
        });
        handle.await.unwrap();
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(5, 10), 50.0);
        assert_eq!(percent(0, 0), 100.0);
    }
}
