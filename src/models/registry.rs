//! 远程登记服务的数据结构
//!
//! 字段名沿用服务端的编码（ckh002 / aac003 ...），Rust 侧使用可读的名称。

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// 被登记人的档案
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// 档案主键
    #[serde(rename = "ckh002", default)]
    pub record_key: JsonValue,
    /// 身份证号
    #[serde(rename = "aac002", default)]
    pub id_number: String,
    /// 姓名
    #[serde(rename = "aac003", default)]
    pub name: String,
}

/// 护理分类
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    /// 护理等级 / 分类ID
    #[serde(rename = "ckh059", default)]
    pub category_id: JsonValue,
    /// 入住类型
    #[serde(rename = "ckh003", default)]
    pub checkin_type: JsonValue,
}

/// 护理项目
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "kh20DTOA", default)]
    pub detail: Option<ItemDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    /// 项目编码
    #[serde(rename = "ckh048", default)]
    pub code: Option<JsonValue>,
}

impl ItemRecord {
    pub fn code(&self) -> Option<&JsonValue> {
        self.detail
            .as_ref()
            .and_then(|d| d.code.as_ref())
            .filter(|c| !c.is_null())
    }
}

/// 登记时提交的护理项目编码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemCode {
    #[serde(rename = "ckh048")]
    pub code: JsonValue,
}

/// 入住登记提交数据
#[derive(Debug, Clone, PartialEq)]
pub struct CheckinPayload {
    pub person: PersonRecord,
    /// 开始日期（服务器当天，yyyymmdd）
    pub start_date: u32,
    pub items: Vec<ItemCode>,
    pub category: CategoryRecord,
    pub nurse_id: String,
    pub physician_id: String,
    pub caregiver_id: String,
    /// 切开气管（ckh281）
    pub tracheotomy: String,
    /// 护理类型（ckf181）
    pub care_type: String,
}

impl CheckinPayload {
    /// 构建服务端要求的完整 JSON
    pub fn to_json(&self) -> JsonValue {
        json!({
            "ckh002": self.person.record_key,
            "aac002": self.person.id_number,
            "aac003": self.person.name,
            "aae030": self.start_date,
            "aae031": null,
            "aae013": null,
            "kh04AddDTOList": self.items,
            "ckh059": self.category.category_id,
            "ckh079": "",
            "ckh099": self.physician_id,
            "ckh500": self.nurse_id,
            "ckh600": self.caregiver_id,
            "ckh200": "",
            "ckh003": self.category.checkin_type,
            "ckh173": null,
            "ckh101": "",
            "ckh281": self.tracheotomy,
            "ckf181": self.care_type,
            "ckh122": "",
            "ckh280": "",
            "kh27DTOList": []
        })
    }
}

/// 提交结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub message: String,
}

impl SubmitResponse {
    pub fn accepted(message: impl Into<String>) -> Self {
        Self {
            accepted: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            accepted: false,
            message: message.into(),
        }
    }
}

/// 解析服务器时间（形如 `"2025-09-30 10:12:45"`），只取日期部分
pub fn parse_server_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().trim_matches('"').split_whitespace().next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// 日期转换为 yyyymmdd 整数
pub fn date_code(date: NaiveDate) -> u32 {
    date.year() as u32 * 10_000 + date.month() * 100 + date.day()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_date() {
        let date = parse_server_date("\"2025-09-30 10:12:45\"").unwrap();
        assert_eq!(date_code(date), 20250930);
        assert_eq!(parse_server_date("2025-01-02"), NaiveDate::from_ymd_opt(2025, 1, 2));
        assert_eq!(parse_server_date("not a date"), None);
        assert_eq!(parse_server_date(""), None);
    }

    #[test]
    fn test_item_code_skips_missing_detail() {
        let items: Vec<ItemRecord> = serde_json::from_str(
            r#"[{"kh20DTOA":{"ckh048":"A01"}},{"kh20DTOA":null},{"kh20DTOA":{"ckh048":null}},{}]"#,
        )
        .unwrap();
        assert_eq!(items[0].code(), Some(&json!("A01")));
        assert!(items[1].code().is_none());
        assert!(items[2].code().is_none());
        assert!(items[3].code().is_none());
    }

    #[test]
    fn test_payload_json_assigns_roles_to_fields() {
        let payload = CheckinPayload {
            person: PersonRecord {
                record_key: json!(1001),
                id_number: "370200".to_string(),
                name: "张三".to_string(),
            },
            start_date: 20250930,
            items: vec![ItemCode { code: json!("A01") }],
            category: CategoryRecord {
                category_id: json!(7),
                checkin_type: json!("01"),
            },
            nurse_id: "N1".to_string(),
            physician_id: "D1".to_string(),
            caregiver_id: "C1".to_string(),
            tracheotomy: "0".to_string(),
            care_type: "05".to_string(),
        };

        let value = payload.to_json();
        assert_eq!(value["ckh500"], "N1");
        assert_eq!(value["ckh099"], "D1");
        assert_eq!(value["ckh600"], "C1");
        assert_eq!(value["aae030"], 20250930);
        assert_eq!(value["kh04AddDTOList"][0]["ckh048"], "A01");
        assert!(value["aae031"].is_null());
    }
}
