use serde::{Deserialize, Serialize};

/// 护理类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CareType {
    /// 家护（失能）
    HomeDisability,
    /// 家护（门诊慢特病）
    HomeChronicOutpatient,
}

impl CareType {
    /// 登记接口使用的护理类型代码（ckf181）
    pub fn code(self) -> &'static str {
        match self {
            CareType::HomeDisability => "05",
            CareType::HomeChronicOutpatient => "06",
        }
    }

    /// 入住表中的原始写法
    pub fn label(self) -> &'static str {
        match self {
            CareType::HomeDisability => "家护（失能）",
            CareType::HomeChronicOutpatient => "家护（门诊慢特病）",
        }
    }
}

/// 一条入住登记请求
///
/// 以姓名作为幂等键：成功名单中已有该姓名时不会再次提交。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub care_type: CareType,
    /// 是否切开气管
    pub tracheotomy: bool,
}

impl RegistrationRequest {
    pub fn new(name: impl Into<String>, care_type: CareType, tracheotomy: bool) -> Self {
        Self {
            name: name.into(),
            care_type,
            tracheotomy,
        }
    }

    /// 幂等键
    pub fn id(&self) -> &str {
        &self.name
    }

    /// 切开气管标记（ckh281）
    pub fn tracheotomy_code(&self) -> &'static str {
        if self.tracheotomy {
            "1"
        } else {
            "0"
        }
    }
}
