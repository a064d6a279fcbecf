use crate::db::TariffStore;
use crate::error::{ReconcileError, StoreError};
use crate::models::{ConsolidatedRoute, ReconcileReport, SupplierRate};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// 单个 prefix 的写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

/// 汇总引擎: consolidated_rates 的唯一写入方
pub struct ConsolidationEngine {
    store: Arc<dyn TariffStore>,
    // 同一进程内的运行串行执行
    run_lock: Mutex<()>,
}

/// 选出主路由 (最便宜) 和备用路由 (次便宜)
///
/// 排序规则: voice_rate 升序, 价格相同时 supplier_id 小者优先.
pub fn select_route(rates: &[SupplierRate]) -> Option<ConsolidatedRoute> {
    let mut ordered: Vec<&SupplierRate> = rates.iter().collect();
    ordered.sort_by(|a, b| {
        a.voice_rate
            .cmp(&b.voice_rate)
            .then_with(|| a.supplier_id.cmp(&b.supplier_id))
    });

    let primary = ordered.first()?;
    Some(ConsolidatedRoute::from_candidates(
        primary,
        ordered.get(1).copied(),
    ))
}

impl ConsolidationEngine {
    pub fn new(store: Arc<dyn TariffStore>) -> Self {
        Self {
            store,
            run_lock: Mutex::new(()),
        }
    }

    /// 重建汇总表; 任一 prefix 失败则整次运行中止, 不执行清理
    pub async fn reconcile(&self) -> Result<ReconcileReport, ReconcileError> {
        let _guard = self.run_lock.lock().await;
        let start_time = Instant::now();

        // 1. 当前所有 prefix 快照
        let prefixes = self
            .store
            .distinct_prefixes()
            .await
            .map_err(ReconcileError::Prefixes)?;
        tracing::info!("开始汇总: {} 个 prefix", prefixes.len());

        // 2. 逐个 prefix 选路并 upsert
        let mut report = ReconcileReport::default();
        for (idx, prefix) in prefixes.iter().enumerate() {
            let outcome = self.consolidate_prefix(prefix).await.map_err(|source| {
                tracing::error!("Consolidation aborted at prefix {}: {}", prefix, source);
                ReconcileError::Prefix {
                    prefix: prefix.clone(),
                    source,
                }
            })?;

            match outcome {
                Some(Upsert::Inserted) => report.inserted += 1,
                Some(Upsert::Updated) => report.updated += 1,
                Some(Upsert::Unchanged) => report.unchanged += 1,
                None => {}
            }
            report.prefixes_processed += 1;

            let current_idx = idx + 1;
            if current_idx % 1000 == 0 {
                tracing::info!("Prefix 进度: {}/{}", current_idx, prefixes.len());
            }
        }

        // 3. 清理已不存在的 prefix
        report.pruned = self
            .store
            .prune_consolidated(&prefixes)
            .await
            .map_err(ReconcileError::Prune)?;

        tracing::info!(
            "汇总完成: processed {}, inserted {}, updated {}, unchanged {}, pruned {}, 耗时 {:?}",
            report.prefixes_processed,
            report.inserted,
            report.updated,
            report.unchanged,
            report.pruned,
            start_time.elapsed()
        );
        Ok(report)
    }

    async fn consolidate_prefix(&self, prefix: &str) -> Result<Option<Upsert>, StoreError> {
        let rates = self.store.rates_for_prefix(prefix).await?;
        // 快照之后被删光的 prefix, 留给下次运行清理
        let Some(route) = select_route(&rates) else {
            return Ok(None);
        };

        match self.store.consolidated_by_prefix(prefix).await? {
            Some(existing) => {
                let current = existing.route();
                if current == route {
                    return Ok(Some(Upsert::Unchanged));
                }
                tracing::info!(
                    "Prefix {}: overwriting consolidated route (primary {}@{} -> {}@{}, backup {:?} -> {:?})",
                    prefix,
                    current.primary_supplier_id,
                    current.primary_rate,
                    route.primary_supplier_id,
                    route.primary_rate,
                    current.backup_supplier_id,
                    route.backup_supplier_id
                );
                self.store.update_consolidated(&route).await?;
                Ok(Some(Upsert::Updated))
            }
            None => {
                self.store.insert_consolidated(&route).await?;
                Ok(Some(Upsert::Inserted))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BillingTerms;
    use bigdecimal::BigDecimal;
    use chrono::Utc;
    use std::str::FromStr;

    fn rate(supplier_id: i64, voice_rate: &str) -> SupplierRate {
        SupplierRate {
            id: supplier_id * 10,
            supplier_id,
            prefix: "44".to_string(),
            description: Some(format!("UK via {supplier_id}")),
            country: None,
            voice_rate: BigDecimal::from_str(voice_rate).unwrap(),
            billing: BillingTerms {
                grace_period: Some(supplier_id.to_string()),
                ..Default::default()
            },
            time_from_day: None,
            time_to_day: None,
            time_from_hour: None,
            time_to_hour: None,
            is_sms: None,
            effective_date: None,
            comments: None,
            round_rules: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn cheapest_is_primary() {
        let route = select_route(&[rate(1, "0.09"), rate(2, "0.03"), rate(3, "0.05")]).unwrap();
        assert_eq!(route.primary_supplier_id, 2);
        assert_eq!(route.backup_supplier_id, Some(3));
        assert_eq!(route.backup_rate, Some(BigDecimal::from_str("0.05").unwrap()));
        assert_eq!(route.description.as_deref(), Some("UK via 2"));
        assert_eq!(route.billing.grace_period.as_deref(), Some("2"));
    }

    #[test]
    fn ties_go_to_lower_supplier_id() {
        let route = select_route(&[rate(9, "0.05"), rate(4, "0.050")]).unwrap();
        assert_eq!(route.primary_supplier_id, 4);
        assert_eq!(route.backup_supplier_id, Some(9));
    }

    #[test]
    fn single_rate_has_no_backup() {
        let route = select_route(&[rate(5, "0.1")]).unwrap();
        assert_eq!(route.primary_supplier_id, 5);
        assert_eq!(route.backup_supplier_id, None);
        assert_eq!(route.backup_rate, None);
    }

    #[test]
    fn empty_has_no_route() {
        assert!(select_route(&[]).is_none());
    }
}
