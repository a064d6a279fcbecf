use super::store::{ConsolidatedStore, ConsolidatedView, RateStore};
use crate::error::StoreError;
use crate::models::{ConsolidatedRate, ConsolidatedRoute, NewSupplierRate, Supplier, SupplierRate};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    suppliers: Vec<Supplier>,
    rates: Vec<SupplierRate>,
    consolidated: BTreeMap<String, ConsolidatedRate>,
    next_supplier_id: i64,
    next_rate_id: i64,
    next_consolidated_id: i64,
    failing_prefixes: HashSet<String>,
}

impl Tables {
    fn check_injected(&self, prefix: &str) -> Result<(), StoreError> {
        if self.failing_prefixes.contains(prefix) {
            return Err(StoreError::Injected(format!("write rejected for prefix {prefix}")));
        }
        Ok(())
    }
}

/// 内存实现, 与 PgRateStore 遵循相同的校验和排序规则
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    tables: RwLock<Tables>,
}

impl MemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让该 prefix 的费率写入和汇总写入都失败
    pub async fn fail_writes_for(&self, prefix: &str) {
        self.tables
            .write()
            .await
            .failing_prefixes
            .insert(prefix.to_string());
    }

    pub async fn clear_failures(&self) {
        self.tables.write().await.failing_prefixes.clear();
    }

    /// 绕过引擎直接改写汇总行 (模拟人工覆盖)
    pub async fn override_consolidated(&self, route: &ConsolidatedRoute) -> bool {
        let mut tables = self.tables.write().await;
        match tables.consolidated.get_mut(&route.prefix) {
            Some(row) => {
                apply_route(row, route);
                true
            }
            None => false,
        }
    }
}

fn apply_route(row: &mut ConsolidatedRate, route: &ConsolidatedRoute) {
    row.country = route.country.clone();
    row.description = route.description.clone();
    row.primary_supplier_id = route.primary_supplier_id;
    row.primary_rate = route.primary_rate.clone();
    row.backup_supplier_id = route.backup_supplier_id;
    row.backup_rate = route.backup_rate.clone();
    row.billing = route.billing.clone();
}

#[async_trait]
impl RateStore for MemoryRateStore {
    async fn supplier_by_name(&self, name: &str) -> Result<Option<Supplier>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.suppliers.iter().find(|s| s.name == name).cloned())
    }

    async fn create_supplier(&self, name: &str, currency: &str) -> Result<Supplier, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.suppliers.iter().find(|s| s.name == name) {
            return Ok(existing.clone());
        }
        tables.next_supplier_id += 1;
        let supplier = Supplier {
            id: tables.next_supplier_id,
            name: name.to_string(),
            currency: currency.to_string(),
            created_at: Utc::now(),
        };
        tables.suppliers.push(supplier.clone());
        Ok(supplier)
    }

    async fn insert_rate(&self, rate: &NewSupplierRate) -> Result<SupplierRate, StoreError> {
        let voice_rate = rate.validate()?;
        let rate = rate.with_defaults();
        let prefix = rate.prefix.trim().to_string();

        let mut tables = self.tables.write().await;
        tables.check_injected(&prefix)?;
        if !tables.suppliers.iter().any(|s| s.id == rate.supplier_id) {
            return Err(StoreError::UnknownSupplier(rate.supplier_id));
        }

        let existing = tables
            .rates
            .iter()
            .position(|r| r.supplier_id == rate.supplier_id && r.prefix == prefix);
        let (id, created_at) = match existing {
            Some(idx) => {
                let old = tables.rates.remove(idx);
                (old.id, old.created_at)
            }
            None => {
                tables.next_rate_id += 1;
                (tables.next_rate_id, Utc::now())
            }
        };

        let stored = SupplierRate {
            id,
            supplier_id: rate.supplier_id,
            prefix,
            description: rate.description.clone(),
            country: rate.country.clone(),
            voice_rate,
            billing: rate.billing.clone(),
            time_from_day: rate.time_from_day.clone(),
            time_to_day: rate.time_to_day.clone(),
            time_from_hour: rate.time_from_hour.clone(),
            time_to_hour: rate.time_to_hour.clone(),
            is_sms: rate.is_sms.clone(),
            effective_date: rate.effective_date.clone(),
            comments: rate.comments.clone(),
            round_rules: rate.round_rules.clone(),
            created_at,
        };
        tables.rates.push(stored.clone());
        Ok(stored)
    }

    async fn delete_rate(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.rates.len();
        tables.rates.retain(|r| r.id != id);
        Ok(tables.rates.len() < before)
    }

    async fn rates_for_supplier(&self, supplier_id: i64) -> Result<Vec<SupplierRate>, StoreError> {
        let tables = self.tables.read().await;
        let mut rates: Vec<_> = tables
            .rates
            .iter()
            .filter(|r| r.supplier_id == supplier_id)
            .cloned()
            .collect();
        rates.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rates)
    }

    async fn distinct_prefixes(&self) -> Result<Vec<String>, StoreError> {
        let tables = self.tables.read().await;
        let prefixes: BTreeSet<&String> = tables.rates.iter().map(|r| &r.prefix).collect();
        Ok(prefixes.into_iter().cloned().collect())
    }

    async fn rates_for_prefix(&self, prefix: &str) -> Result<Vec<SupplierRate>, StoreError> {
        let tables = self.tables.read().await;
        let mut rates: Vec<_> = tables
            .rates
            .iter()
            .filter(|r| r.prefix == prefix)
            .cloned()
            .collect();
        rates.sort_by(|a, b| {
            a.voice_rate
                .cmp(&b.voice_rate)
                .then_with(|| a.supplier_id.cmp(&b.supplier_id))
        });
        Ok(rates)
    }
}

#[async_trait]
impl ConsolidatedView for MemoryRateStore {
    async fn list_consolidated(&self) -> Result<Vec<ConsolidatedRate>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.consolidated.values().cloned().collect())
    }

    async fn consolidated_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<ConsolidatedRate>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.consolidated.get(prefix).cloned())
    }
}

#[async_trait]
impl ConsolidatedStore for MemoryRateStore {
    async fn insert_consolidated(
        &self,
        route: &ConsolidatedRoute,
    ) -> Result<ConsolidatedRate, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_injected(&route.prefix)?;
        if tables.consolidated.contains_key(&route.prefix) {
            return Err(StoreError::DuplicateRoute(route.prefix.clone()));
        }

        tables.next_consolidated_id += 1;
        let row = ConsolidatedRate {
            id: tables.next_consolidated_id,
            prefix: route.prefix.clone(),
            country: route.country.clone(),
            description: route.description.clone(),
            primary_supplier_id: route.primary_supplier_id,
            primary_rate: route.primary_rate.clone(),
            backup_supplier_id: route.backup_supplier_id,
            backup_rate: route.backup_rate.clone(),
            billing: route.billing.clone(),
            created_at: Utc::now(),
        };
        tables.consolidated.insert(row.prefix.clone(), row.clone());
        Ok(row)
    }

    async fn update_consolidated(
        &self,
        route: &ConsolidatedRoute,
    ) -> Result<ConsolidatedRate, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_injected(&route.prefix)?;
        let row = tables
            .consolidated
            .get_mut(&route.prefix)
            .ok_or_else(|| StoreError::MissingRoute(route.prefix.clone()))?;
        apply_route(row, route);
        Ok(row.clone())
    }

    async fn prune_consolidated(&self, keep: &[String]) -> Result<u64, StoreError> {
        let keep: HashSet<&str> = keep.iter().map(String::as_str).collect();
        let mut tables = self.tables.write().await;
        let before = tables.consolidated.len();
        tables
            .consolidated
            .retain(|prefix, _| keep.contains(prefix.as_str()));
        Ok((before - tables.consolidated.len()) as u64)
    }
}
