use crate::error::StoreError;
use crate::models::{ConsolidatedRate, ConsolidatedRoute, NewSupplierRate, Supplier, SupplierRate};
use async_trait::async_trait;

/// 供应商与原始费率
///
/// 导入流程只拿到这个 trait, 无法写汇总表.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// 按名称精确匹配 (区分大小写)
    async fn supplier_by_name(&self, name: &str) -> Result<Option<Supplier>, StoreError>;

    /// 名称已存在时返回已有供应商 (并发导入同名供应商只会得到一条记录)
    async fn create_supplier(&self, name: &str, currency: &str) -> Result<Supplier, StoreError>;

    /// 插入或替换 (supplier_id, prefix) 对应的费率, 缺失的计费参数补默认值
    async fn insert_rate(&self, rate: &NewSupplierRate) -> Result<SupplierRate, StoreError>;

    /// 返回是否删除了记录
    async fn delete_rate(&self, id: i64) -> Result<bool, StoreError>;

    async fn rates_for_supplier(&self, supplier_id: i64) -> Result<Vec<SupplierRate>, StoreError>;

    /// 去重后的 prefix, 升序
    async fn distinct_prefixes(&self) -> Result<Vec<String>, StoreError>;

    /// 按 voice_rate ASC, supplier_id ASC 排序
    async fn rates_for_prefix(&self, prefix: &str) -> Result<Vec<SupplierRate>, StoreError>;
}

/// 汇总表只读视图
#[async_trait]
pub trait ConsolidatedView: Send + Sync {
    async fn list_consolidated(&self) -> Result<Vec<ConsolidatedRate>, StoreError>;

    async fn consolidated_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<ConsolidatedRate>, StoreError>;
}

/// 汇总表写入, 仅由 ConsolidationEngine 使用
#[async_trait]
pub trait ConsolidatedStore: ConsolidatedView {
    async fn insert_consolidated(
        &self,
        route: &ConsolidatedRoute,
    ) -> Result<ConsolidatedRate, StoreError>;

    /// 按 prefix 原地覆盖全部路由字段
    async fn update_consolidated(
        &self,
        route: &ConsolidatedRoute,
    ) -> Result<ConsolidatedRate, StoreError>;

    /// 删除 prefix 不在 `keep` 中的行, 返回删除行数
    async fn prune_consolidated(&self, keep: &[String]) -> Result<u64, StoreError>;
}

/// 汇总引擎需要同时读原始费率和写汇总表
pub trait TariffStore: RateStore + ConsolidatedStore {}

impl<T: RateStore + ConsolidatedStore> TariffStore for T {}
