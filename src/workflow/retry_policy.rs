//! 重试决策
//!
//! 纯函数，不做任何 I/O：给定失败类型和已用次数，决定下一步。

use crate::services::failure_classifier::FailureKind;

/// 失败后的下一步
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// 换一个人员重新提交，不等待
    ReselectPersonnel,
    /// 等待固定间隔后重新查询基础数据并提交
    RetryAfterBackoff,
    /// 放弃该请求
    GiveUp,
}

/// 决定第 `attempt` 次尝试（从1开始）失败之后的下一步
pub fn next_step(kind: FailureKind, attempt: u32, max_attempts: u32) -> NextStep {
    if attempt >= max_attempts {
        return NextStep::GiveUp;
    }

    match kind {
        FailureKind::RoleCapacityExceeded(_) => NextStep::ReselectPersonnel,
        FailureKind::Transient => NextStep::RetryAfterBackoff,
        FailureKind::NotFound
        | FailureKind::Rejected
        | FailureKind::PersistenceFailure
        | FailureKind::ExhaustionFailure => NextStep::GiveUp,
    }
}
