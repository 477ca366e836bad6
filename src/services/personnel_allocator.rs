//! 人员分配 - 业务能力层
//!
//! 为护士、医生、护理员三个角色各维护一个候选列表，按已负责人数升序排列，
//! 每次分配负责人数最少且未达上限的人员；负责人数相同时按花名册顺序先到先得。
//!
//! 远程服务报告"已达上限"的人员进入本次运行的忽略列表，不落盘，
//! 下次运行重新从服务端获知。

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::personnel::{PersonnelCandidate, PersonnelRecord, Role};
use crate::services::checkpoint_store::CheckpointStore;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// 某角色已没有可分配的人员
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("没有可用的{role}")]
pub struct NotAvailable {
    pub role: Role,
}

/// 一次登记的三个角色分配结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub nurse_id: String,
    pub physician_id: String,
    pub caregiver_id: String,
}

impl Assignment {
    pub fn id_for(&self, role: Role) -> &str {
        match role {
            Role::Nurse => &self.nurse_id,
            Role::Physician => &self.physician_id,
            Role::Caregiver => &self.caregiver_id,
        }
    }
}

/// 角色人员统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleStats {
    pub total: usize,
    pub available: usize,
    pub exhausted: usize,
    pub used_capacity: u64,
    pub total_capacity: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    candidate: PersonnelCandidate,
    /// 花名册中的先后顺序，用于计数相同时的先到先得
    rank: usize,
}

#[derive(Debug)]
struct RolePool {
    limit: u32,
    /// 按 (usage_count, rank) 升序
    active: Vec<Slot>,
    /// 已不在花名册中的人员，只保留计数用于落盘
    retired: Vec<PersonnelCandidate>,
    exhausted: HashSet<String>,
}

impl RolePool {
    fn new(limit: u32, candidates: Vec<PersonnelCandidate>) -> Self {
        let (retired, active): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|c| c.retired);
        let mut pool = Self {
            limit,
            active: active
                .into_iter()
                .enumerate()
                .map(|(rank, candidate)| Slot { candidate, rank })
                .collect(),
            retired,
            exhausted: HashSet::new(),
        };
        pool.sort();
        pool
    }

    fn sort(&mut self) {
        self.active
            .sort_by_key(|slot| (slot.candidate.usage_count, slot.rank));
    }

    fn select(&self) -> Option<&PersonnelCandidate> {
        for slot in &self.active {
            if slot.candidate.usage_count >= self.limit {
                // 列表升序，后面的人员计数只会更大
                break;
            }
            if !self.exhausted.contains(&slot.candidate.id) {
                return Some(&slot.candidate);
            }
        }
        None
    }

    fn snapshot(&self) -> Vec<PersonnelCandidate> {
        self.active
            .iter()
            .map(|slot| slot.candidate.clone())
            .chain(self.retired.iter().cloned())
            .collect()
    }

    fn stats(&self) -> RoleStats {
        RoleStats {
            total: self.active.len(),
            available: self
                .active
                .iter()
                .filter(|s| {
                    s.candidate.usage_count < self.limit
                        && !self.exhausted.contains(&s.candidate.id)
                })
                .count(),
            exhausted: self.exhausted.len(),
            used_capacity: self
                .active
                .iter()
                .map(|s| u64::from(s.candidate.usage_count))
                .sum(),
            total_capacity: self.active.len() as u64 * u64::from(self.limit),
        }
    }
}

/// 人员分配器
///
/// 持有三个角色的候选列表；所有计数变更都立即写回断点存储。
#[derive(Debug)]
pub struct PersonnelAllocator {
    store: Arc<CheckpointStore>,
    nurses: RolePool,
    physicians: RolePool,
    caregivers: RolePool,
}

impl PersonnelAllocator {
    /// 从断点存储加载候选列表
    pub fn load(store: Arc<CheckpointStore>, limits: impl Fn(Role) -> u32) -> AppResult<Self> {
        let load_pool = |role: Role| -> AppResult<RolePool> {
            Ok(RolePool::new(limits(role), store.load_candidates(role)?))
        };
        let nurses = load_pool(Role::Nurse)?;
        let physicians = load_pool(Role::Physician)?;
        let caregivers = load_pool(Role::Caregiver)?;

        let allocator = Self {
            store,
            nurses,
            physicians,
            caregivers,
        };
        info!(
            "加载人员数据 - 护士: {}, 医生: {}, 护理员: {}",
            allocator.pool(Role::Nurse).active.len(),
            allocator.pool(Role::Physician).active.len(),
            allocator.pool(Role::Caregiver).active.len()
        );
        Ok(allocator)
    }

    pub fn from_config(store: Arc<CheckpointStore>, config: &Config) -> AppResult<Self> {
        Self::load(store, |role| config.role_limit(role))
    }

    fn pool(&self, role: Role) -> &RolePool {
        match role {
            Role::Nurse => &self.nurses,
            Role::Physician => &self.physicians,
            Role::Caregiver => &self.caregivers,
        }
    }

    fn pool_mut(&mut self, role: Role) -> &mut RolePool {
        match role {
            Role::Nurse => &mut self.nurses,
            Role::Physician => &mut self.physicians,
            Role::Caregiver => &mut self.caregivers,
        }
    }

    /// 用远程花名册刷新某角色的候选列表
    ///
    /// 已知人员保留计数，新人员从 0 开始；离开花名册的人员不再参与分配，
    /// 计数连同离开标记仍然保留在文件中，重新加载后也不参与分配。
    pub fn sync_roster(&mut self, role: Role, roster_ids: &[String]) -> AppResult<()> {
        let pool = self.pool_mut(role);

        let mut known: HashMap<String, PersonnelCandidate> = pool
            .active
            .drain(..)
            .map(|slot| slot.candidate)
            .chain(pool.retired.drain(..))
            .map(|c| (c.id.clone(), c))
            .collect();

        let mut seen = HashSet::new();
        let mut active = Vec::with_capacity(roster_ids.len());
        for id in roster_ids {
            if !seen.insert(id.clone()) {
                continue;
            }
            let mut candidate = known.remove(id).unwrap_or_else(|| {
                debug!("新增{}: {}", role, id);
                PersonnelCandidate::new(id.clone())
            });
            candidate.retired = false;
            active.push(Slot {
                candidate,
                rank: active.len(),
            });
        }

        let mut retired: Vec<PersonnelCandidate> = known
            .into_values()
            .map(|mut c| {
                c.retired = true;
                c
            })
            .collect();
        retired.sort_by(|a, b| a.id.cmp(&b.id));

        pool.active = active;
        pool.retired = retired;
        pool.sort();

        info!(
            "处理{}数据完成，共 {} 人（不在花名册: {} 人）",
            role,
            pool.active.len(),
            pool.retired.len()
        );
        self.persist(role)
    }

    /// 按角色拆分花名册并刷新全部候选列表
    ///
    /// `specific_caregivers` 非空时，护理员只保留姓名包含 `"名字-"` 的人员。
    pub fn sync_from_roster(
        &mut self,
        records: &[PersonnelRecord],
        specific_caregivers: &[String],
    ) -> AppResult<()> {
        for role in Role::ALL {
            let ids: Vec<String> = records
                .iter()
                .filter(|r| r.role() == Some(role))
                .filter(|r| {
                    role != Role::Caregiver || is_specific_caregiver(r, specific_caregivers)
                })
                .filter_map(|r| r.id.clone())
                .filter(|id| !id.is_empty())
                .collect();
            self.sync_roster(role, &ids)?;
        }
        Ok(())
    }

    /// 选出某角色负责人数最少的可用人员
    pub fn select_candidate(&self, role: Role) -> Result<String, NotAvailable> {
        let pool = self.pool(role);
        match pool.select() {
            Some(candidate) => {
                debug!(
                    "分配{}: {} (当前负责: {}/{})",
                    role, candidate.id, candidate.usage_count, pool.limit
                );
                Ok(candidate.id.clone())
            }
            None => {
                warn!("没有可用的{}", role);
                Err(NotAvailable { role })
            }
        }
    }

    /// 为三个角色各选一人
    pub fn select_assignment(&self) -> Result<Assignment, NotAvailable> {
        Ok(Assignment {
            nurse_id: self.select_candidate(Role::Nurse)?,
            physician_id: self.select_candidate(Role::Physician)?,
            caregiver_id: self.select_candidate(Role::Caregiver)?,
        })
    }

    /// 远程服务确认登记成功后，增加该人员计数并立即落盘
    ///
    /// 落盘失败时内存中的计数仍然保留（远程已经接受），错误交给调用方处理。
    pub fn confirm_assignment(&mut self, role: Role, candidate_id: &str) -> AppResult<()> {
        self.increment(role, candidate_id)?;
        self.persist(role)
    }

    /// 确认一次分配中的三个角色
    ///
    /// 三个计数先全部在内存中增加，再逐个落盘；某个角色写入失败不影响其他角色，
    /// 返回第一个错误。
    pub fn confirm(&mut self, assignment: &Assignment) -> AppResult<()> {
        let mut first_error = None;
        for role in Role::ALL {
            if let Err(e) = self.increment(role, assignment.id_for(role)) {
                first_error.get_or_insert(e);
            }
        }
        for role in Role::ALL {
            if let Err(e) = self.persist(role) {
                warn!("保存{}计数失败: {}", role, e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn increment(&mut self, role: Role, candidate_id: &str) -> AppResult<u32> {
        let pool = self.pool_mut(role);
        let slot = pool
            .active
            .iter_mut()
            .find(|s| s.candidate.id == candidate_id)
            .ok_or_else(|| AppError::Other(format!("未找到{}: {}", role, candidate_id)))?;

        slot.candidate.usage_count += 1;
        let count = slot.candidate.usage_count;
        pool.sort();

        debug!("{} {} 计数更新为 {}", role, candidate_id, count);
        Ok(count)
    }

    /// 标记人员已达上限（仅本次运行有效）
    ///
    /// 护理员没有远程上限信号，只受本地计数上限约束，不加入忽略列表。
    pub fn mark_exhausted(&mut self, role: Role, candidate_id: &str) {
        if role == Role::Caregiver {
            warn!("不支持标记{}为已满: {}", role, candidate_id);
            return;
        }
        if self.pool_mut(role).exhausted.insert(candidate_id.to_string()) {
            warn!("{} {} 已达上限，加入忽略列表", role, candidate_id);
        }
    }

    pub fn is_exhausted(&self, role: Role, candidate_id: &str) -> bool {
        self.pool(role).exhausted.contains(candidate_id)
    }

    /// 清空本次运行的忽略列表
    pub fn reset_exhausted(&mut self) {
        for pool in [&mut self.nurses, &mut self.physicians, &mut self.caregivers] {
            pool.exhausted.clear();
        }
        info!("已重置人员忽略列表");
    }

    /// 某角色参与分配的人员（当前排序）
    pub fn candidates(&self, role: Role) -> Vec<PersonnelCandidate> {
        self.pool(role)
            .active
            .iter()
            .map(|s| s.candidate.clone())
            .collect()
    }

    pub fn limit(&self, role: Role) -> u32 {
        self.pool(role).limit
    }

    pub fn stats(&self, role: Role) -> RoleStats {
        self.pool(role).stats()
    }

    fn persist(&self, role: Role) -> AppResult<()> {
        self.store.save_candidates(role, &self.pool(role).snapshot())
    }
}

fn is_specific_caregiver(record: &PersonnelRecord, specific: &[String]) -> bool {
    if specific.is_empty() {
        return true;
    }
    let name = record.name.as_deref().unwrap_or_default();
    specific
        .iter()
        .any(|prefix| name.contains(&format!("{}-", prefix)))
}
