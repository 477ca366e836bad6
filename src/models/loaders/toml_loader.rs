//! 入住表加载
//!
//! 入住表导出为 TOML 后的格式：
//!
//! ```toml
//! [[rows]]
//! name = "张三"
//! care_type = "家护（失能）"
//! tracheotomy = "否"
//! ```

use crate::error::{AppResult, InputError};
use crate::models::request::{CareType, RegistrationRequest};
use phf::phf_map;
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

static CARE_TYPES: phf::Map<&'static str, CareType> = phf_map! {
    "家护（失能）" => CareType::HomeDisability,
    "家护（门诊慢特病）" => CareType::HomeChronicOutpatient,
};

#[derive(Debug, Deserialize)]
struct RequestSheet {
    #[serde(default)]
    rows: Vec<RequestRow>,
}

#[derive(Debug, Deserialize)]
struct RequestRow {
    #[serde(default)]
    name: String,
    #[serde(default)]
    care_type: String,
    #[serde(default)]
    tracheotomy: String,
}

/// 从 TOML 文件加载登记请求
pub async fn load_requests(path: &Path) -> AppResult<Vec<RegistrationRequest>> {
    if !path.exists() {
        return Err(InputError::NotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    info!("开始读取入住表: {}", path.display());

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| InputError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

    let requests = parse_requests(&content).map_err(|source| InputError::TomlParseFailed {
        path: path.display().to_string(),
        source,
    })?;

    info!("成功读取 {} 个用户数据", requests.len());
    Ok(requests)
}

/// 解析入住表内容，跳过姓名为空或护理类型未知的行
pub fn parse_requests(content: &str) -> Result<Vec<RegistrationRequest>, toml::de::Error> {
    let sheet: RequestSheet = toml::from_str(content)?;

    let requests = sheet
        .rows
        .into_iter()
        .filter_map(|row| {
            let name = row.name.trim();
            if name.is_empty() {
                return None;
            }

            let care_type = row.care_type.trim();
            let Some(care_type) = CARE_TYPES.get(care_type).copied() else {
                error!("未知护理类型: {} - {}", name, care_type);
                return None;
            };

            Some(RegistrationRequest::new(
                name,
                care_type,
                row.tracheotomy.trim() == "是",
            ))
        })
        .collect();

    Ok(requests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rows() {
        let content = r#"
            [[rows]]
            name = " 张三 "
            care_type = "家护（失能）"
            tracheotomy = "是"

            [[rows]]
            name = "李四"
            care_type = "家护（门诊慢特病）"

            [[rows]]
            name = ""
            care_type = "家护（失能）"

            [[rows]]
            name = "王五"
            care_type = "院护"
        "#;

        let requests = parse_requests(content).unwrap();
        assert_eq!(
            requests,
            vec![
                RegistrationRequest::new("张三", CareType::HomeDisability, true),
                RegistrationRequest::new("李四", CareType::HomeChronicOutpatient, false),
            ]
        );
        assert_eq!(requests[0].care_type.code(), "05");
        assert_eq!(requests[1].tracheotomy_code(), "0");
    }

    #[test]
    fn test_empty_sheet() {
        assert!(parse_requests("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_requests(&dir.path().join("none.toml")).await.unwrap_err();
        assert!(err.to_string().contains("文件不存在"));
    }
}
