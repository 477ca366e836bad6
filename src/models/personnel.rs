use serde::{Deserialize, Serialize};
use std::fmt;

/// 人员角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// 责任护士
    Nurse,
    /// 责任医师
    Physician,
    /// 护理员
    Caregiver,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Nurse, Role::Physician, Role::Caregiver];

    /// 花名册中的角色代码（ckh122）
    pub fn code(self) -> &'static str {
        match self {
            Role::Nurse => "12",
            Role::Physician => "13",
            Role::Caregiver => "10",
        }
    }

    /// 从角色代码解析
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "12" => Some(Role::Nurse),
            "13" => Some(Role::Physician),
            "10" => Some(Role::Caregiver),
            _ => None,
        }
    }

    /// 中文名称
    pub fn name(self) -> &'static str {
        match self {
            Role::Nurse => "护士",
            Role::Physician => "医生",
            Role::Caregiver => "护理员",
        }
    }

    /// 配置文件中的上限键名
    pub fn limit_key(self) -> &'static str {
        match self {
            Role::Nurse => "nurses_limit",
            Role::Physician => "doctors_limit",
            Role::Caregiver => "caregivers_limit",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 候选人员及其已负责人数
///
/// 与断点文件格式保持一致：`{"id": "...", "count": 3}`；
/// 已离开花名册的人员额外带 `"retired": true`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelCandidate {
    pub id: String,
    #[serde(rename = "count")]
    pub usage_count: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retired: bool,
}

impl PersonnelCandidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            usage_count: 0,
            retired: false,
        }
    }

    pub fn with_count(id: impl Into<String>, usage_count: u32) -> Self {
        Self {
            id: id.into(),
            usage_count,
            retired: false,
        }
    }
}

/// 远程花名册中的一条人员记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelRecord {
    /// 人员ID
    #[serde(rename = "ckh174", default)]
    pub id: Option<String>,
    /// 角色代码
    #[serde(rename = "ckh122", default)]
    pub role_code: Option<String>,
    /// 姓名（形如 "张梅-xxxx"）
    #[serde(rename = "aac003", default)]
    pub name: Option<String>,
}

impl PersonnelRecord {
    pub fn role(&self) -> Option<Role> {
        self.role_code.as_deref().and_then(Role::from_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_code_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_code(role.code()), Some(role));
        }
        assert_eq!(Role::from_code("99"), None);
    }

    #[test]
    fn test_candidate_uses_count_field_name() {
        let json = serde_json::to_string(&PersonnelCandidate::with_count("N1", 2)).unwrap();
        assert_eq!(json, r#"{"id":"N1","count":2}"#);
    }

    #[test]
    fn test_retired_flag_defaults_to_false() {
        let candidate: PersonnelCandidate = serde_json::from_str(r#"{"id":"N1","count":2}"#).unwrap();
        assert!(!candidate.retired);

        let retired: PersonnelCandidate =
            serde_json::from_str(r#"{"id":"N2","count":4,"retired":true}"#).unwrap();
        assert!(retired.retired);
    }

    #[test]
    fn test_personnel_record_from_roster_json() {
        let record: PersonnelRecord =
            serde_json::from_str(r#"{"ckh174":"D01","ckh122":"13","aac003":"李四-医师"}"#)
                .unwrap();
        assert_eq!(record.role(), Some(Role::Physician));
        assert_eq!(record.id.as_deref(), Some("D01"));
    }
}
