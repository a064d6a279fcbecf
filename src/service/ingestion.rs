use crate::db::RateStore;
use crate::error::IngestError;
use crate::models::{BillingTerms, IngestReport, IngestStatus, NewSupplierRate, RowError, Supplier};
use crate::parsing::{self, resolve, Field, RowOutcome};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// 费率文件导入服务
pub struct IngestService {
    store: Arc<dyn RateStore>,
    default_currency: String,
}

impl IngestService {
    pub fn new(store: Arc<dyn RateStore>, default_currency: impl Into<String>) -> Self {
        Self {
            store,
            default_currency: default_currency.into(),
        }
    }

    /// 导入磁盘上的费率文件, 文件句柄在读取完成后立即释放
    pub async fn ingest_file(
        &self,
        path: &Path,
        supplier_name: &str,
    ) -> Result<IngestReport, IngestError> {
        let bytes = tokio::fs::read(path).await?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.ingest_bytes(&bytes, supplier_name).await
    }

    /// 导入流程: 供应商 -> 表头 -> 逐行解析写入; 单行失败只记录不中断
    pub async fn ingest_bytes(
        &self,
        bytes: &[u8],
        supplier_name: &str,
    ) -> Result<IngestReport, IngestError> {
        let supplier = self.resolve_supplier(supplier_name).await?;
        let text = String::from_utf8_lossy(bytes);

        let Some(sheet) = parsing::decode_rows(&text) else {
            tracing::warn!("No header found in rate file for supplier {}", supplier.name);
            return Ok(IngestReport::no_header(supplier.id));
        };
        tracing::info!(
            "Supplier {} (id {}): header at line {}, columns {:?}",
            supplier.name,
            supplier.id,
            sheet.header_line,
            sheet.headers
        );

        // 同一文件内重复的 prefix 只算一次 (后一行覆盖前一行)
        let mut imported_prefixes: HashSet<String> = HashSet::new();
        let mut skipped = 0usize;
        let mut errors: Vec<RowError> = Vec::new();

        for outcome in sheet.rows {
            match outcome {
                RowOutcome::Malformed { row, reason } => {
                    tracing::warn!("Row {} could not be decoded: {}", row, reason);
                    errors.push(RowError {
                        row,
                        record: IndexMap::new(),
                        reason,
                    });
                }
                RowOutcome::Decoded(decoded) => {
                    let Some(candidate) = build_candidate(supplier.id, &decoded.record) else {
                        skipped += 1;
                        continue;
                    };
                    match self.store.insert_rate(&candidate).await {
                        Ok(stored) => {
                            if !imported_prefixes.insert(stored.prefix) {
                                tracing::warn!(
                                    "Row {} replaces an earlier row for prefix {}",
                                    decoded.row,
                                    candidate.prefix
                                );
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Row {} rejected: {}", decoded.row, e);
                            errors.push(RowError {
                                row: decoded.row,
                                record: decoded.record,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        let imported = imported_prefixes.len();
        let status = if imported > 0 {
            IngestStatus::Imported
        } else {
            IngestStatus::NoValidRows
        };
        tracing::info!(
            "导入完成: supplier {}, imported {}, skipped {}, failed {}",
            supplier.name,
            imported,
            skipped,
            errors.len()
        );

        Ok(IngestReport {
            supplier_id: supplier.id,
            status,
            imported,
            header_line: Some(sheet.header_line),
            headers: sheet.headers,
            errors,
        })
    }

    /// 按名称查找供应商, 不存在则以默认币种创建
    async fn resolve_supplier(&self, name: &str) -> Result<Supplier, IngestError> {
        let to_error = |source| IngestError::Supplier {
            name: name.to_string(),
            source,
        };

        if let Some(supplier) = self.store.supplier_by_name(name).await.map_err(to_error)? {
            return Ok(supplier);
        }

        let supplier = self
            .store
            .create_supplier(name, &self.default_currency)
            .await
            .map_err(to_error)?;
        tracing::info!(
            "Created supplier {} (id {}, currency {})",
            supplier.name,
            supplier.id,
            supplier.currency
        );
        Ok(supplier)
    }
}

/// 把一行映射为待写入费率; 缺 prefix 或 voice_rate 时返回 None (静默跳过)
pub fn build_candidate(supplier_id: i64, record: &IndexMap<String, String>) -> Option<NewSupplierRate> {
    let prefix = resolve(record, Field::Prefix)?;
    let voice_rate = resolve(record, Field::VoiceRate)?;
    let get = |field| resolve(record, field);

    Some(NewSupplierRate {
        supplier_id,
        prefix,
        description: get(Field::Description),
        // 国家信息由 description 承载
        country: None,
        voice_rate,
        billing: BillingTerms {
            grace_period: get(Field::GracePeriod),
            minimal_time: get(Field::MinimalTime),
            resolution: get(Field::Resolution),
            rate_multiplier: get(Field::RateMultiplier),
            rate_addition: get(Field::RateAddition),
            surcharge_time: get(Field::SurchargeTime),
            surcharge_amount: get(Field::SurchargeAmount),
        },
        time_from_day: get(Field::TimeFromDay),
        time_to_day: get(Field::TimeToDay),
        time_from_hour: get(Field::TimeFromHour),
        time_to_hour: get(Field::TimeToHour),
        is_sms: get(Field::IsSms),
        effective_date: get(Field::EffectiveDate),
        comments: get(Field::Comments),
        round_rules: get(Field::RoundRules),
    })
}
