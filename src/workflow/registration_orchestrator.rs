//! 登记处理流程 - 流程层
//!
//! 核心职责：定义"一个用户"的完整登记流程
//!
//! 流程顺序：
//! 1. 成功名单检查（命中则直接跳过，不发任何请求）
//! 2. 查询基础数据：档案 → 服务器日期 → 护理分类 → 护理项目
//! 3. 分配护士 / 医生 / 护理员
//! 4. 提交登记
//! 5. 成功：确认三个分配并落盘 → 写入成功名单
//!    人员已满：标记忽略，回到第 3 步换人（不等待）
//!    临时错误：等待固定间隔，回到第 2 步
//!
//! 尝试次数受 `max_attempts` 限制。

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::clients::RemoteRegistry;
use crate::config::Config;
use crate::models::registry::date_code;
use crate::models::{
    CategoryRecord, CheckinPayload, ItemCode, ItemRecord, PersonRecord, RegistrationRequest,
};
use crate::services::failure_classifier::{
    classify_error, classify_rejection, FailureKind, FailureReason,
};
use crate::services::personnel_allocator::{Assignment, PersonnelAllocator};
use crate::services::checkpoint_store::CompletionLedger;
use crate::workflow::registration_ctx::RegistrationCtx;
use crate::workflow::retry_policy::{next_step, NextStep};

/// 单个请求的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RegistrationOutcome {
    /// 登记成功
    Success(Assignment),
    /// 已在成功名单中
    Skipped,
    /// 登记失败
    Failed(FailureReason),
}

impl RegistrationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RegistrationOutcome::Success(_))
    }
}

/// 流程参数
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// 护理项目下标
    pub item_indices: Vec<usize>,
    pub checkin_type: String,
    pub category_code: String,
}

impl RegistrationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.retry.max_attempts,
            retry_delay: config.retry_delay(),
            item_indices: config.nursing_item_indices.clone(),
            checkin_type: config.api.checkin_type.clone(),
            category_code: config.api.category_code.clone(),
        }
    }
}

/// 一次尝试所需的基础数据
#[derive(Debug, Clone)]
struct ReferenceData {
    person: PersonRecord,
    start_date: u32,
    category: CategoryRecord,
    items: Vec<ItemCode>,
}

/// 登记处理流程
///
/// 独占人员分配器和成功名单；请求必须一个一个处理。
pub struct RegistrationOrchestrator {
    registry: Arc<dyn RemoteRegistry>,
    allocator: PersonnelAllocator,
    ledger: CompletionLedger,
    settings: RegistrationSettings,
}

impl RegistrationOrchestrator {
    pub fn new(
        registry: Arc<dyn RemoteRegistry>,
        allocator: PersonnelAllocator,
        ledger: CompletionLedger,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            registry,
            allocator,
            ledger,
            settings,
        }
    }

    pub fn allocator(&self) -> &PersonnelAllocator {
        &self.allocator
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    /// 处理一个登记请求
    pub async fn process(
        &mut self,
        request: &RegistrationRequest,
        ctx: &RegistrationCtx,
    ) -> RegistrationOutcome {
        if self.ledger.contains(request.id()) {
            info!("{} ⏭️ 已在成功名单中，跳过", ctx);
            return RegistrationOutcome::Skipped;
        }

        info!("{} 开始登记 ({})", ctx, request.care_type.label());

        let mut reference: Option<ReferenceData> = None;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!("{} 第 {}/{} 次尝试", ctx, attempt, self.settings.max_attempts);

            let resolved = match reference.take() {
                Some(data) => Ok(data),
                None => self.resolve(request, ctx).await,
            };

            let failure = match resolved {
                Ok(data) => {
                    let result = self.assign_and_submit(request, ctx, &data).await;
                    reference = Some(data);
                    match result {
                        Ok(assignment) => {
                            info!(
                                "{} ✓ 登记成功 (护士: {}, 医生: {}, 护理员: {})",
                                ctx,
                                assignment.nurse_id,
                                assignment.physician_id,
                                assignment.caregiver_id
                            );
                            return RegistrationOutcome::Success(assignment);
                        }
                        Err(reason) => reason,
                    }
                }
                Err(reason) => reason,
            };

            match next_step(failure.kind, attempt, self.settings.max_attempts) {
                NextStep::ReselectPersonnel => {
                    warn!("{} ⚠️ {}，重新分配人员", ctx, failure);
                }
                NextStep::RetryAfterBackoff => {
                    warn!(
                        "{} ⚠️ {}，{} 毫秒后重试",
                        ctx,
                        failure,
                        self.settings.retry_delay.as_millis()
                    );
                    reference = None;
                    tokio::time::sleep(self.settings.retry_delay).await;
                }
                NextStep::GiveUp => {
                    error!("{} ❌ 登记失败 (第 {} 次尝试): {}", ctx, attempt, failure);
                    return RegistrationOutcome::Failed(failure);
                }
            }
        }
    }

    /// 查询档案、服务器日期、护理分类和护理项目
    async fn resolve(
        &self,
        request: &RegistrationRequest,
        ctx: &RegistrationCtx,
    ) -> Result<ReferenceData, FailureReason> {
        let person = self
            .registry
            .lookup_person(&request.name)
            .await
            .map_err(remote_failure)?
            .ok_or_else(|| {
                FailureReason::new(
                    FailureKind::NotFound,
                    format!("未找到用户信息: {}", request.name),
                )
            })?;

        let date = self.registry.server_date().await.map_err(remote_failure)?;

        let category = self
            .registry
            .list_care_categories(&self.settings.checkin_type, &self.settings.category_code)
            .await
            .map_err(remote_failure)?
            .into_iter()
            .next()
            .ok_or_else(|| FailureReason::new(FailureKind::NotFound, "未查询到护理分类"))?;

        let all_items = self
            .registry
            .list_care_items(&category)
            .await
            .map_err(remote_failure)?;
        let items = select_items(&all_items, &self.settings.item_indices);
        if items.is_empty() {
            return Err(FailureReason::new(
                FailureKind::NotFound,
                format!("未查询到可用的护理项目 (共 {} 个)", all_items.len()),
            ));
        }

        debug!(
            "{} 基础数据: 日期 {}, 护理项目 {} 个",
            ctx,
            date_code(date),
            items.len()
        );

        Ok(ReferenceData {
            person,
            start_date: date_code(date),
            category,
            items,
        })
    }

    /// 分配人员并提交；成功时确认分配并写入成功名单
    async fn assign_and_submit(
        &mut self,
        request: &RegistrationRequest,
        ctx: &RegistrationCtx,
        data: &ReferenceData,
    ) -> Result<Assignment, FailureReason> {
        let assignment = self.allocator.select_assignment().map_err(|e| {
            FailureReason::new(FailureKind::ExhaustionFailure, e.to_string())
        })?;

        let payload = CheckinPayload {
            person: data.person.clone(),
            start_date: data.start_date,
            items: data.items.clone(),
            category: data.category.clone(),
            nurse_id: assignment.nurse_id.clone(),
            physician_id: assignment.physician_id.clone(),
            caregiver_id: assignment.caregiver_id.clone(),
            tracheotomy: request.tracheotomy_code().to_string(),
            care_type: request.care_type.code().to_string(),
        };

        info!("{} 📤 提交登记...", ctx);
        let response = self
            .registry
            .submit(&payload)
            .await
            .map_err(remote_failure)?;

        if !response.accepted {
            let kind = classify_rejection(&response.message);
            if let FailureKind::RoleCapacityExceeded(role) = kind {
                self.allocator
                    .mark_exhausted(role, assignment.id_for(role));
            }
            return Err(FailureReason::new(kind, response.message));
        }

        self.commit(request, &assignment)?;
        Ok(assignment)
    }

    /// 远程已接受：先确认人员计数，再写成功名单
    fn commit(
        &mut self,
        request: &RegistrationRequest,
        assignment: &Assignment,
    ) -> Result<(), FailureReason> {
        self.allocator
            .confirm(assignment)
            .map_err(|e| FailureReason::new(FailureKind::PersistenceFailure, e.to_string()))?;

        self.ledger
            .record(request.id())
            .map_err(|e| FailureReason::new(FailureKind::PersistenceFailure, e.to_string()))?;

        Ok(())
    }
}

fn remote_failure(error: crate::error::AppError) -> FailureReason {
    FailureReason::new(classify_error(&error), error.to_string())
}

/// 按下标挑选护理项目，跳过越界和没有编码的项目
pub fn select_items(items: &[ItemRecord], indices: &[usize]) -> Vec<ItemCode> {
    indices
        .iter()
        .filter_map(|&i| items.get(i))
        .filter_map(|item| item.code())
        .map(|code| ItemCode { code: code.clone() })
        .collect()
}
