//! 断点存储 - 业务能力层
//!
//! 持久化两类数据，进程重启后继续使用：
//! - 每个角色的人员计数列表（`[{"id": "...", "count": n}]`）
//! - 成功名单（已成功登记的姓名列表）
//!
//! 每次写入都是整文件重写：先写临时文件并 fsync，再 rename 覆盖，
//! 避免写到一半时崩溃留下半截文件。

use crate::config::Config;
use crate::error::{AppError, AppResult, CheckpointError};
use crate::models::personnel::{PersonnelCandidate, Role};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 断点存储
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    nurse_file: PathBuf,
    doctor_file: PathBuf,
    caregiver_file: PathBuf,
    ledger_file: PathBuf,
}

impl CheckpointStore {
    pub fn new(
        nurse_file: impl Into<PathBuf>,
        doctor_file: impl Into<PathBuf>,
        caregiver_file: impl Into<PathBuf>,
        ledger_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            nurse_file: nurse_file.into(),
            doctor_file: doctor_file.into(),
            caregiver_file: caregiver_file.into(),
            ledger_file: ledger_file.into(),
        }
    }

    /// 按配置中的文件路径创建
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.role_file(Role::Nurse),
            config.role_file(Role::Physician),
            config.role_file(Role::Caregiver),
            config.resolve(&config.files.success_file),
        )
    }

    /// 所有文件放在同一目录下，使用默认文件名
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(
            dir.join("nurseObjs.json"),
            dir.join("doctorObjs.json"),
            dir.join("caregiverObjs.json"),
            dir.join("successfulUsers.json"),
        )
    }

    pub fn role_path(&self, role: Role) -> &Path {
        match role {
            Role::Nurse => &self.nurse_file,
            Role::Physician => &self.doctor_file,
            Role::Caregiver => &self.caregiver_file,
        }
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_file
    }

    /// 读取角色人员计数；文件不存在视为空列表，内容损坏返回错误
    pub fn load_candidates(&self, role: Role) -> AppResult<Vec<PersonnelCandidate>> {
        read_json(self.role_path(role))
    }

    /// 覆盖写入角色人员计数
    pub fn save_candidates(&self, role: Role, candidates: &[PersonnelCandidate]) -> AppResult<()> {
        write_json(self.role_path(role), &candidates)?;
        debug!("{}计数已保存，共 {} 人", role, candidates.len());
        Ok(())
    }

    /// 读取成功名单
    pub fn load_ledger(&self) -> AppResult<Vec<String>> {
        read_json(&self.ledger_file)
    }

    /// 覆盖写入成功名单
    pub fn save_ledger(&self, ids: &[String]) -> AppResult<()> {
        write_json(&self.ledger_file, &ids)
    }
}

/// 成功名单
///
/// 只增不减：一旦记录，之后的运行都不会再处理该请求。
#[derive(Debug)]
pub struct CompletionLedger {
    store: Arc<CheckpointStore>,
    ids: Vec<String>,
    index: HashSet<String>,
}

impl CompletionLedger {
    /// 从断点存储加载
    pub fn load(store: Arc<CheckpointStore>) -> AppResult<Self> {
        let ids = store.load_ledger()?;
        let index = ids.iter().cloned().collect();
        info!("加载成功名单: {} 人", ids.len());
        Ok(Self { store, ids, index })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// 记录一个已成功的请求
    ///
    /// 先落盘再更新内存；写入失败时内存状态不变。
    /// 已存在时不重复写入，返回 `false`。
    pub fn record(&mut self, id: &str) -> AppResult<bool> {
        if self.contains(id) {
            return Ok(false);
        }

        let mut next = self.ids.clone();
        next.push(id.to_string());
        self.store.save_ledger(&next)?;

        self.ids = next;
        self.index.insert(id.to_string());
        info!("用户 {} 已添加到成功名单", id);
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

fn read_json<T>(path: &Path) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }

    let content = fs::read_to_string(path).map_err(|source| CheckpointError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&content).map_err(|source| {
        AppError::Checkpoint(CheckpointError::Corrupt {
            path: path.display().to_string(),
            source,
        })
    })
}

fn write_json<T>(path: &Path, value: &T) -> AppResult<()>
where
    T: Serialize + ?Sized,
{
    let data = serde_json::to_string_pretty(value).map_err(CheckpointError::SerializeFailed)?;
    let display = path.display().to_string();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::checkpoint_write_failed(&display, e))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let write_tmp = || -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data.as_bytes())?;
        file.sync_all()?;
        Ok(())
    };
    write_tmp().map_err(|e| AppError::checkpoint_write_failed(&display, e))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        AppError::checkpoint_write_failed(&display, e)
    })
}
