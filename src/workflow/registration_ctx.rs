//! 登记处理上下文
//!
//! 封装"我正在处理第几个用户"这一信息，只用于日志

use std::fmt::Display;

/// 登记处理上下文
#[derive(Debug, Clone)]
pub struct RegistrationCtx {
    /// 在本批中的序号（从1开始）
    pub index: usize,

    /// 本批总数
    pub total: usize,

    /// 被登记人姓名
    pub name: String,
}

impl RegistrationCtx {
    pub fn new(index: usize, total: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            total,
            name: name.into(),
        }
    }

    /// 单独处理一个请求时使用
    pub fn single(name: impl Into<String>) -> Self {
        Self::new(1, 1, name)
    }
}

impl Display for RegistrationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[用户 {}/{} {}]", self.index, self.total, self.name)
    }
}
