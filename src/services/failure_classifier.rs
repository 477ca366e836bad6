//! 失败分类 - 业务能力层
//!
//! 远程服务只返回中文提示文本，这里是唯一把文本翻译成失败类型的地方。
//! 服务端改动措辞后，无法识别的拒绝一律归为 `Transient`。

use crate::error::{ApiError, AppError};
use crate::models::personnel::Role;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use tracing::error;

static CAPACITY_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"责任(护士|医师)负责人数已达"));

/// 失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// 档案、护理分类或护理项目不存在
    NotFound,
    /// 远程服务报告某角色人员负责人数已满
    RoleCapacityExceeded(Role),
    /// 网络错误、超时或无法识别的拒绝
    Transient,
    /// 明确的、重试无意义的拒绝
    Rejected,
    /// 本地断点写入失败
    PersistenceFailure,
    /// 某角色没有可分配的人员
    ExhaustionFailure,
}

impl FailureKind {
    pub fn is_capacity(self) -> bool {
        matches!(self, FailureKind::RoleCapacityExceeded(_))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => f.write_str("数据不存在"),
            FailureKind::RoleCapacityExceeded(role) => write!(f, "{}负责人数已满", role),
            FailureKind::Transient => f.write_str("临时错误"),
            FailureKind::Rejected => f.write_str("登记被拒绝"),
            FailureKind::PersistenceFailure => f.write_str("断点保存失败"),
            FailureKind::ExhaustionFailure => f.write_str("无可用人员"),
        }
    }
}

/// 失败原因：类型 + 可读的说明
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// 对远程服务的拒绝文本分类
pub fn classify_rejection(message: &str) -> FailureKind {
    match &*CAPACITY_PATTERN {
        Ok(re) => {
            if let Some(caps) = re.captures(message) {
                return match &caps[1] {
                    "护士" => FailureKind::RoleCapacityExceeded(Role::Nurse),
                    _ => FailureKind::RoleCapacityExceeded(Role::Physician),
                };
            }
        }
        Err(e) => error!("上限提示正则无效: {}", e),
    }

    // 护理员没有远程上限信号参与重新分配，重试只会得到同样的结果
    if message.contains("护理员负责人数已达") {
        return FailureKind::Rejected;
    }

    FailureKind::Transient
}

/// 对调用远程服务时的错误分类
pub fn classify_error(error: &AppError) -> FailureKind {
    match error {
        AppError::Api(ApiError::BadStatus { status, .. }) if (400..500).contains(status) => {
            FailureKind::Rejected
        }
        AppError::Api(_) => FailureKind::Transient,
        AppError::Checkpoint(_) => FailureKind::PersistenceFailure,
        _ => FailureKind::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_capacity_rejections() {
        assert_eq!(
            classify_rejection("该责任护士负责人数已达上限(50人)"),
            FailureKind::RoleCapacityExceeded(Role::Nurse)
        );
        assert_eq!(
            classify_rejection("责任医师负责人数已达80人，请更换"),
            FailureKind::RoleCapacityExceeded(Role::Physician)
        );
    }

    #[test]
    fn test_capacity_pattern_compiles_once() {
        assert!(CAPACITY_PATTERN.is_ok());
        // 多次调用共用同一个编译结果
        for _ in 0..3 {
            assert_eq!(
                classify_rejection("责任护士负责人数已达上限"),
                FailureKind::RoleCapacityExceeded(Role::Nurse)
            );
        }
    }

    #[test]
    fn test_caregiver_limit_is_not_retried() {
        assert_eq!(
            classify_rejection("护理员负责人数已达上限"),
            FailureKind::Rejected
        );
    }

    #[test]
    fn test_unknown_text_falls_back_to_transient() {
        assert_eq!(classify_rejection("系统繁忙"), FailureKind::Transient);
        assert_eq!(classify_rejection(""), FailureKind::Transient);
        // 措辞变化时无法识别
        assert_eq!(classify_rejection("责任护士已满"), FailureKind::Transient);
    }

    #[test]
    fn test_classify_error() {
        let bad_request = AppError::Api(ApiError::BadStatus {
            endpoint: "/x".to_string(),
            status: 404,
            body: String::new(),
        });
        assert_eq!(classify_error(&bad_request), FailureKind::Rejected);

        let server_error = AppError::Api(ApiError::BadStatus {
            endpoint: "/x".to_string(),
            status: 502,
            body: String::new(),
        });
        assert_eq!(classify_error(&server_error), FailureKind::Transient);

        let bad_date = AppError::Api(ApiError::BadServerDate("??".to_string()));
        assert_eq!(classify_error(&bad_date), FailureKind::Transient);
    }

    #[test]
    fn test_reason_display() {
        let reason = FailureReason::new(
            FailureKind::RoleCapacityExceeded(Role::Nurse),
            "责任护士负责人数已达上限",
        );
        assert_eq!(reason.to_string(), "护士负责人数已满: 责任护士负责人数已达上限");
    }
}
