//! 程序配置
//!
//! 配置来自 TOML 文件，部分字段可以被环境变量覆盖。
//! 配置文件不存在时使用默认配置；文件存在但解析失败则视为启动错误。

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::personnel::Role;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub files: FilesConfig,
    pub personnel: PersonnelConfig,
    /// 登记时勾选的护理项目下标
    pub nursing_item_indices: Vec<usize>,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    /// 相对路径的基准目录（配置文件所在目录）
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// 远程登记服务配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// 会话 cookie
    pub token: String,
    pub referer: String,
    pub timeout_secs: u64,
    /// 机构编码
    pub org_code: String,
    pub dept_name: String,
    pub region_code: u32,
    /// 入住类型
    pub checkin_type: String,
    /// 护理分类代码
    pub category_code: String,
}

/// 文件路径配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub requests_file: String,
    pub nurse_file: String,
    pub doctor_file: String,
    pub caregiver_file: String,
    pub success_file: String,
    pub report_dir: String,
    pub error_log: String,
}

/// 人员上限配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonnelConfig {
    pub nurses_limit: u32,
    pub doctors_limit: u32,
    pub caregivers_limit: u32,
    /// 指定护理员（花名册姓名以 "姓名-" 开头）；为空时不筛选
    pub specific_caregivers: Vec<String>,
}

/// 重试配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

/// 日志配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub enable_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            files: FilesConfig::default(),
            personnel: PersonnelConfig::default(),
            nursing_item_indices: vec![0, 1, 9, 11, 13, 14, 15, 22, 27, 28, 29, 58],
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/api/rest".to_string(),
            token: String::new(),
            referer: String::new(),
            timeout_secs: 30,
            org_code: "H37021106950".to_string(),
            dept_name: "黄岛远保康诊所".to_string(),
            region_code: 370284,
            checkin_type: "01".to_string(),
            category_code: "04".to_string(),
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            requests_file: "requests.toml".to_string(),
            nurse_file: "nurseObjs.json".to_string(),
            doctor_file: "doctorObjs.json".to_string(),
            caregiver_file: "caregiverObjs.json".to_string(),
            success_file: "successfulUsers.json".to_string(),
            report_dir: "reports".to_string(),
            error_log: "error.log".to_string(),
        }
    }
}

impl Default for PersonnelConfig {
    fn default() -> Self {
        Self {
            nurses_limit: 50,
            doctors_limit: 80,
            caregivers_limit: 30,
            specific_caregivers: Vec::new(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_file: true,
        }
    }
}

impl Config {
    /// 加载配置：文件 → 环境变量覆盖 → 校验
    ///
    /// 文件不存在时使用默认配置，此时日志尚未初始化，由调用方提示。
    pub fn load(path: &Path) -> AppResult<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?;
            Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
                path: path.display().to_string(),
                source,
            })?
        } else {
            Self::default()
        };

        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文本解析（未设置 base_dir）
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    fn apply_env_overrides(&mut self) -> AppResult<()> {
        if let Ok(v) = std::env::var("NURSING_API_BASE_URL") {
            self.api.base_url = v;
        }
        if let Ok(v) = std::env::var("NURSING_API_TOKEN") {
            self.api.token = v;
        }
        if let Ok(v) = std::env::var("NURSING_REQUESTS_FILE") {
            self.files.requests_file = v;
        }
        if let Ok(v) = std::env::var("NURSING_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("NURSING_MAX_ATTEMPTS") {
            self.retry.max_attempts = v.parse().map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: "NURSING_MAX_ATTEMPTS".to_string(),
                value: v.clone(),
                expected_type: "u32".to_string(),
            })?;
        }
        Ok(())
    }

    /// 校验配置取值
    pub fn validate(&self) -> AppResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::invalid_config("api.base_url", "不能为空"));
        }
        for role in Role::ALL {
            if self.role_limit(role) == 0 {
                return Err(AppError::invalid_config(
                    format!("personnel.{}", role.limit_key()),
                    "必须大于 0",
                ));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::invalid_config("retry.max_attempts", "必须大于 0"));
        }
        Ok(())
    }

    /// 角色上限
    pub fn role_limit(&self, role: Role) -> u32 {
        match role {
            Role::Nurse => self.personnel.nurses_limit,
            Role::Physician => self.personnel.doctors_limit,
            Role::Caregiver => self.personnel.caregivers_limit,
        }
    }

    /// 角色计数文件路径
    pub fn role_file(&self, role: Role) -> PathBuf {
        let name = match role {
            Role::Nurse => &self.files.nurse_file,
            Role::Physician => &self.files.doctor_file,
            Role::Caregiver => &self.files.caregiver_file,
        };
        self.resolve(name)
    }

    /// 获取文件完整路径，相对路径与配置文件目录拼接
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}
