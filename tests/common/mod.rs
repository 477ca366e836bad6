//! 集成测试共用的内存版登记服务

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use nursing_checkin_submit::error::{ApiError, AppResult};
use nursing_checkin_submit::models::registry::ItemDetail;
use nursing_checkin_submit::models::{
    CategoryRecord, CheckinPayload, ItemRecord, PersonRecord, PersonnelCandidate,
    PersonnelRecord, SubmitResponse,
};
use nursing_checkin_submit::services::CheckpointStore;
use nursing_checkin_submit::workflow::RegistrationSettings;
use nursing_checkin_submit::{
    CompletionLedger, PersonnelAllocator, RegistrationOrchestrator, RemoteRegistry, Role,
};

/// 脚本化的提交结果
#[derive(Debug, Clone)]
pub enum Scripted {
    Accept,
    Reject(String),
    NetworkError,
}

/// 内存版登记服务
///
/// 提交结果按脚本依次返回，脚本用完后一律接受；
/// 同一个姓名第二次被接受时返回"重复登记"拒绝。
#[derive(Default)]
pub struct MockRegistry {
    pub script: Mutex<VecDeque<Scripted>>,
    pub submissions: Mutex<Vec<CheckinPayload>>,
    pub registered: Mutex<HashSet<String>>,
    pub unknown_people: Mutex<HashSet<String>>,
    pub roster: Mutex<Vec<PersonnelRecord>>,
    pub lookup_calls: AtomicUsize,
    pub date_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(script: Vec<Scripted>) -> Arc<Self> {
        let mock = Self::default();
        *mock.script.lock().unwrap() = script.into();
        Arc::new(mock)
    }

    pub fn forget_person(&self, name: &str) {
        self.unknown_people.lock().unwrap().insert(name.to_string());
    }

    pub fn set_roster(&self, roster: Vec<PersonnelRecord>) {
        *self.roster.lock().unwrap() = roster;
    }

    pub fn total_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
            + self.date_calls.load(Ordering::SeqCst)
            + self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn submit_count(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn submitted_nurses(&self) -> Vec<String> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.nurse_id.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteRegistry for MockRegistry {
    async fn lookup_person(&self, name: &str) -> AppResult<Option<PersonRecord>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.unknown_people.lock().unwrap().contains(name) {
            return Ok(None);
        }
        Ok(Some(PersonRecord {
            record_key: json!(format!("key-{}", name)),
            id_number: "370200000000000000".to_string(),
            name: name.to_string(),
        }))
    }

    async fn server_date(&self) -> AppResult<NaiveDate> {
        self.date_calls.fetch_add(1, Ordering::SeqCst);
        Ok(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap())
    }

    async fn list_care_categories(
        &self,
        checkin_type: &str,
        _category_code: &str,
    ) -> AppResult<Vec<CategoryRecord>> {
        Ok(vec![CategoryRecord {
            category_id: json!(4),
            checkin_type: json!(checkin_type),
        }])
    }

    async fn list_care_items(&self, _category: &CategoryRecord) -> AppResult<Vec<ItemRecord>> {
        Ok((0..3)
            .map(|i| ItemRecord {
                detail: Some(ItemDetail {
                    code: Some(json!(format!("I{:02}", i))),
                }),
            })
            .collect())
    }

    async fn list_personnel(&self, _org_code: &str) -> AppResult<Vec<PersonnelRecord>> {
        Ok(self.roster.lock().unwrap().clone())
    }

    async fn submit(&self, payload: &CheckinPayload) -> AppResult<SubmitResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().unwrap().push(payload.clone());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reject(message)) => Ok(SubmitResponse::rejected(message)),
            Some(Scripted::NetworkError) => Err(ApiError::BadStatus {
                endpoint: "/nursing/kh01/checkIn".to_string(),
                status: 503,
                body: "Service Unavailable".to_string(),
            }
            .into()),
            Some(Scripted::Accept) | None => {
                let mut registered = self.registered.lock().unwrap();
                if !registered.insert(payload.person.name.clone()) {
                    return Ok(SubmitResponse::rejected("该人员已存在入住登记"));
                }
                Ok(SubmitResponse::accepted("本次业务办理成功"))
            }
        }
    }
}

/// 在目录中写入三个角色的初始计数
pub fn seed_personnel(
    dir: &Path,
    nurses: &[(&str, u32)],
    doctors: &[(&str, u32)],
    caregivers: &[(&str, u32)],
) -> Arc<CheckpointStore> {
    let store = Arc::new(CheckpointStore::in_dir(dir));
    for (role, list) in [
        (Role::Nurse, nurses),
        (Role::Physician, doctors),
        (Role::Caregiver, caregivers),
    ] {
        let candidates: Vec<PersonnelCandidate> = list
            .iter()
            .map(|(id, count)| PersonnelCandidate::with_count(*id, *count))
            .collect();
        store.save_candidates(role, &candidates).unwrap();
    }
    store
}

pub fn settings(max_attempts: u32) -> RegistrationSettings {
    RegistrationSettings {
        max_attempts,
        retry_delay: Duration::from_millis(0),
        item_indices: vec![0, 2],
        checkin_type: "01".to_string(),
        category_code: "04".to_string(),
    }
}

/// 从断点存储创建流程（人员上限统一为 `limit`）
pub fn orchestrator(
    registry: Arc<MockRegistry>,
    store: Arc<CheckpointStore>,
    limit: u32,
    max_attempts: u32,
) -> RegistrationOrchestrator {
    orchestrator_with(registry, store, limit, settings(max_attempts))
}

pub fn orchestrator_with(
    registry: Arc<MockRegistry>,
    store: Arc<CheckpointStore>,
    limit: u32,
    settings: RegistrationSettings,
) -> RegistrationOrchestrator {
    let allocator = PersonnelAllocator::load(store.clone(), |_| limit).unwrap();
    let ledger = CompletionLedger::load(store).unwrap();
    RegistrationOrchestrator::new(registry, allocator, ledger, settings)
}

pub fn counts(store: &CheckpointStore, role: Role) -> Vec<(String, u32)> {
    let mut list: Vec<(String, u32)> = store
        .load_candidates(role)
        .unwrap()
        .into_iter()
        .map(|c| (c.id, c.usage_count))
        .collect();
    list.sort();
    list
}

pub fn roster_record(id: &str, role: Role, name: &str) -> PersonnelRecord {
    PersonnelRecord {
        id: Some(id.to_string()),
        role_code: Some(role.code().to_string()),
        name: Some(name.to_string()),
    }
}
