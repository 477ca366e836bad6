/// 登记服务 HTTP 客户端
///
/// 封装所有与远程登记服务相关的调用逻辑
use crate::clients::remote_registry::RemoteRegistry;
use crate::config::{ApiConfig, Config};
use crate::error::{ApiError, AppError, AppResult};
use crate::models::registry::parse_server_date;
use crate::utils::truncate_text;
use crate::models::{
    CategoryRecord, CheckinPayload, ItemRecord, PersonRecord, PersonnelRecord, SubmitResponse,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, REFERER,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing::{debug, error, warn};

/// 登记成功时服务端返回文本中包含的标记
pub const ACCEPTED_MARKER: &str = "本次业务办理成功";

/// 登记服务客户端
pub struct HttpRegistryClient {
    http: reqwest::Client,
    api: ApiConfig,
}

#[derive(Debug, Default, Deserialize)]
struct PersonPage {
    #[serde(default)]
    list: Vec<PersonRecord>,
}

impl HttpRegistryClient {
    /// 创建新的登记服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let api = config.api.clone();

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json;charset=UTF-8"),
        );
        if !api.token.is_empty() {
            let cookie = HeaderValue::from_str(&api.token)
                .map_err(|e| AppError::invalid_config("api.token", e.to_string()))?;
            headers.insert(COOKIE, cookie);
        }
        if !api.referer.is_empty() {
            let referer = HeaderValue::from_str(&api.referer)
                .map_err(|e| AppError::invalid_config("api.referer", e.to_string()))?;
            headers.insert(REFERER, referer);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AppError::api_request_failed("client", e))?;

        Ok(Self { http, api })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api.base_url.trim_end_matches('/'), endpoint)
    }

    /// 发送请求并读取响应文本，非 2xx 状态转换为 `ApiError::BadStatus`
    async fn send(&self, endpoint: &str, request: reqwest::RequestBuilder) -> AppResult<String> {
        debug!("API请求: {}", endpoint);

        let response = request
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if !status.is_success() {
            error!(
                "API请求失败 {}: HTTP {} | {}",
                endpoint,
                status.as_u16(),
                extract_server_message(&body)
            );
            return Err(ApiError::BadStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(body)
    }

    async fn get_text(&self, endpoint: &str) -> AppResult<String> {
        self.send(endpoint, self.http.get(self.url(endpoint))).await
    }

    async fn post_text(&self, endpoint: &str, body: &JsonValue) -> AppResult<String> {
        self.send(endpoint, self.http.post(self.url(endpoint)).json(body))
            .await
    }

    /// POST 并解析 JSON，服务端返回 `null` 或空体时取默认值
    async fn post_json<T>(&self, endpoint: &str, body: &JsonValue) -> AppResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let text = self.post_text(endpoint, body).await?;
        if text.trim().is_empty() {
            return Ok(T::default());
        }
        let parsed: Option<T> =
            serde_json::from_str(&text).map_err(|source| ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            })?;
        Ok(parsed.unwrap_or_default())
    }
}

#[async_trait]
impl RemoteRegistry for HttpRegistryClient {
    async fn lookup_person(&self, name: &str) -> AppResult<Option<PersonRecord>> {
        let payload = json!({
            "ckh004": "01",
            "cka025": self.api.region_code,
            "aaa027": "",
            "ckh005": self.api.org_code,
            "deptName": self.api.dept_name,
            "aac002": "",
            "aac003": name,
            "ckh003": "",
            "ckg066": "",
            "ckh280": "",
            "ckh079": "",
            "ckh101": "",
            "ckf181": "",
            "pageNum": 1,
            "pageSize": 10,
            "isOver": true
        });

        let page: PersonPage = self
            .post_json("/nursing/kh01/selectPlanAlreadyMade", &payload)
            .await?;

        let person = page.list.into_iter().next();
        if person.is_none() {
            warn!("未找到用户信息: {}", name);
        }
        Ok(person)
    }

    async fn server_date(&self) -> AppResult<NaiveDate> {
        let text = self.get_text("/sys/getDatabaseTime/getTime").await?;
        debug!("获取数据库时间: {}", text);
        parse_server_date(&text).ok_or_else(|| ApiError::BadServerDate(text).into())
    }

    async fn list_care_categories(
        &self,
        checkin_type: &str,
        category_code: &str,
    ) -> AppResult<Vec<CategoryRecord>> {
        let payload = json!({ "ckh003": checkin_type, "ckh057": category_code });
        let categories: Vec<CategoryRecord> =
            self.post_json("/nursing/kh18/queryKH18", &payload).await?;
        debug!("查询护理分类成功，获得 {} 条记录", categories.len());
        Ok(categories)
    }

    async fn list_care_items(&self, category: &CategoryRecord) -> AppResult<Vec<ItemRecord>> {
        let payload = json!({ "ckh059": category.category_id });
        let items: Vec<ItemRecord> = self
            .post_json("/nursing/kh18/queryKH20ClassifyList", &payload)
            .await?;
        debug!("查询护理项目成功，获得 {} 个项目", items.len());
        Ok(items)
    }

    async fn list_personnel(&self, org_code: &str) -> AppResult<Vec<PersonnelRecord>> {
        let payload = json!({ "ckf020": org_code });
        let personnel: Vec<PersonnelRecord> =
            self.post_json("/sys/kh34/queryKH34List", &payload).await?;
        debug!("查询人员列表成功，获得 {} 人", personnel.len());
        Ok(personnel)
    }

    async fn submit(&self, payload: &CheckinPayload) -> AppResult<SubmitResponse> {
        debug!("提交护理入住登记: {}", payload.person.name);

        match self
            .post_text("/nursing/kh01/checkIn", &payload.to_json())
            .await
        {
            Ok(text) if text.contains(ACCEPTED_MARKER) => {
                debug!("登记成功: {}", payload.person.name);
                Ok(SubmitResponse::accepted(text))
            }
            Ok(text) => {
                warn!(
                    "登记失败: {} - {}",
                    payload.person.name,
                    truncate_text(&text, 200)
                );
                Ok(SubmitResponse::rejected(text))
            }
            Err(AppError::Api(ApiError::BadStatus { body, .. })) => {
                Ok(SubmitResponse::rejected(extract_server_message(&body)))
            }
            Err(e) => Err(e),
        }
    }
}

/// 从错误响应体中提取服务端消息：JSON 的 message / error 字段，否则原文
pub fn extract_server_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<JsonValue>(body) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_server_message() {
        assert_eq!(
            extract_server_message(r#"{"code":500,"message":"责任护士负责人数已达上限"}"#),
            "责任护士负责人数已达上限"
        );
        assert_eq!(extract_server_message(r#"{"error":"boom"}"#), "boom");
        assert_eq!(extract_server_message("plain text"), "plain text");
        assert_eq!(extract_server_message(r#"{"code":1}"#), r#"{"code":1}"#);
    }

    #[test]
    fn test_url_join() {
        let mut config = Config::default();
        config.api.base_url = "http://host/api/rest/".to_string();
        let client = HttpRegistryClient::new(&config).unwrap();
        assert_eq!(
            client.url("/sys/getDatabaseTime/getTime"),
            "http://host/api/rest/sys/getDatabaseTime/getTime"
        );
    }
}
