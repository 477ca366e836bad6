//! 远程登记服务接口
//!
//! 核心流程只依赖此 trait，测试中可替换为内存实现。

use crate::error::AppResult;
use crate::models::{
    CategoryRecord, CheckinPayload, ItemRecord, PersonRecord, PersonnelRecord, SubmitResponse,
};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait RemoteRegistry: Send + Sync {
    /// 按姓名查询档案，未找到返回 `None`
    async fn lookup_person(&self, name: &str) -> AppResult<Option<PersonRecord>>;

    /// 服务器当前日期
    async fn server_date(&self) -> AppResult<NaiveDate>;

    /// 查询护理分类
    async fn list_care_categories(
        &self,
        checkin_type: &str,
        category_code: &str,
    ) -> AppResult<Vec<CategoryRecord>>;

    /// 查询某分类下的护理项目
    async fn list_care_items(&self, category: &CategoryRecord) -> AppResult<Vec<ItemRecord>>;

    /// 查询机构花名册
    async fn list_personnel(&self, org_code: &str) -> AppResult<Vec<PersonnelRecord>>;

    /// 提交入住登记
    ///
    /// 服务端明确拒绝时返回 `Ok(SubmitResponse { accepted: false, .. })`，
    /// 网络错误、超时返回 `Err`。
    async fn submit(&self, payload: &CheckinPayload) -> AppResult<SubmitResponse>;
}
