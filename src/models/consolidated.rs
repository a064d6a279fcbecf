use super::{BillingTerms, SupplierRate};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 汇总路由表 (consolidated_rates), 每个 prefix 一行
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ConsolidatedRate {
    pub id: i64,
    pub prefix: String,
    pub country: Option<String>,
    pub description: Option<String>,
    pub primary_supplier_id: i64,
    pub primary_rate: BigDecimal,
    pub backup_supplier_id: Option<i64>,
    pub backup_rate: Option<BigDecimal>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub billing: BillingTerms,
    pub created_at: DateTime<Utc>,
}

impl ConsolidatedRate {
    /// 提取可由引擎重新计算的部分 (不含 id/created_at)
    pub fn route(&self) -> ConsolidatedRoute {
        ConsolidatedRoute {
            prefix: self.prefix.clone(),
            country: self.country.clone(),
            description: self.description.clone(),
            primary_supplier_id: self.primary_supplier_id,
            primary_rate: self.primary_rate.clone(),
            backup_supplier_id: self.backup_supplier_id,
            backup_rate: self.backup_rate.clone(),
            billing: self.billing.clone(),
        }
    }
}

/// 引擎计算出的路由内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedRoute {
    pub prefix: String,
    pub country: Option<String>,
    pub description: Option<String>,
    pub primary_supplier_id: i64,
    pub primary_rate: BigDecimal,
    pub backup_supplier_id: Option<i64>,
    pub backup_rate: Option<BigDecimal>,
    #[serde(flatten)]
    pub billing: BillingTerms,
}

impl ConsolidatedRoute {
    /// 主路由取自 primary, 备用路由只取 backup 的供应商与价格
    pub fn from_candidates(primary: &SupplierRate, backup: Option<&SupplierRate>) -> Self {
        Self {
            prefix: primary.prefix.clone(),
            country: primary.country.clone(),
            description: primary.description.clone(),
            primary_supplier_id: primary.supplier_id,
            primary_rate: primary.voice_rate.clone(),
            backup_supplier_id: backup.map(|b| b.supplier_id),
            backup_rate: backup.map(|b| b.voice_rate.clone()),
            billing: primary.billing.clone(),
        }
    }
}
