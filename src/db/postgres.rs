use super::store::{ConsolidatedStore, ConsolidatedView, RateStore};
use crate::error::StoreError;
use crate::models::{ConsolidatedRate, ConsolidatedRoute, NewSupplierRate, Supplier, SupplierRate};
use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::PgPool;

const SUPPLIER_RATE_COLUMNS: &str = "id, supplier_id, prefix, description, country, voice_rate, \
     grace_period, minimal_time, resolution, rate_multiplier, rate_addition, \
     surcharge_time, surcharge_amount, time_from_day, time_to_day, time_from_hour, \
     time_to_hour, is_sms, effective_date, comments, round_rules, created_at";

const CONSOLIDATED_COLUMNS: &str = "id, prefix, country, description, primary_supplier_id, \
     primary_rate, backup_supplier_id, backup_rate, grace_period, minimal_time, resolution, \
     rate_multiplier, rate_addition, surcharge_time, surcharge_amount, created_at";

/// PostgreSQL 实现
#[derive(Debug, Clone)]
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateStore for PgRateStore {
    async fn supplier_by_name(&self, name: &str) -> Result<Option<Supplier>, StoreError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            SELECT id, name, currency, created_at
            FROM suppliers
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(supplier)
    }

    async fn create_supplier(&self, name: &str, currency: &str) -> Result<Supplier, StoreError> {
        let supplier = sqlx::query_as::<_, Supplier>(
            r#"
            INSERT INTO suppliers (name, currency)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, currency, created_at
            "#,
        )
        .bind(name)
        .bind(currency)
        .fetch_one(&self.pool)
        .await?;
        Ok(supplier)
    }

    async fn insert_rate(&self, rate: &NewSupplierRate) -> Result<SupplierRate, StoreError> {
        let voice_rate = rate.validate()?;
        let rate = rate.with_defaults();

        let sql = format!(
            r#"
            INSERT INTO supplier_rates (
                supplier_id, prefix, description, country, voice_rate,
                grace_period, minimal_time, resolution, rate_multiplier, rate_addition,
                surcharge_time, surcharge_amount,
                time_from_day, time_to_day, time_from_hour, time_to_hour,
                is_sms, effective_date, comments, round_rules
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (supplier_id, prefix) DO UPDATE SET
                description = EXCLUDED.description,
                country = EXCLUDED.country,
                voice_rate = EXCLUDED.voice_rate,
                grace_period = EXCLUDED.grace_period,
                minimal_time = EXCLUDED.minimal_time,
                resolution = EXCLUDED.resolution,
                rate_multiplier = EXCLUDED.rate_multiplier,
                rate_addition = EXCLUDED.rate_addition,
                surcharge_time = EXCLUDED.surcharge_time,
                surcharge_amount = EXCLUDED.surcharge_amount,
                time_from_day = EXCLUDED.time_from_day,
                time_to_day = EXCLUDED.time_to_day,
                time_from_hour = EXCLUDED.time_from_hour,
                time_to_hour = EXCLUDED.time_to_hour,
                is_sms = EXCLUDED.is_sms,
                effective_date = EXCLUDED.effective_date,
                comments = EXCLUDED.comments,
                round_rules = EXCLUDED.round_rules
            RETURNING {SUPPLIER_RATE_COLUMNS}
            "#
        );

        let stored = sqlx::query_as::<_, SupplierRate>(&sql)
            .bind(rate.supplier_id)
            .bind(rate.prefix.trim())
            .bind(&rate.description)
            .bind(&rate.country)
            .bind(voice_rate)
            .bind(&rate.billing.grace_period)
            .bind(&rate.billing.minimal_time)
            .bind(&rate.billing.resolution)
            .bind(&rate.billing.rate_multiplier)
            .bind(&rate.billing.rate_addition)
            .bind(&rate.billing.surcharge_time)
            .bind(&rate.billing.surcharge_amount)
            .bind(&rate.time_from_day)
            .bind(&rate.time_to_day)
            .bind(&rate.time_from_hour)
            .bind(&rate.time_to_hour)
            .bind(&rate.is_sms)
            .bind(&rate.effective_date)
            .bind(&rate.comments)
            .bind(&rate.round_rules)
            .fetch_one(&self.pool)
            .await?;
        Ok(stored)
    }

    async fn delete_rate(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM supplier_rates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rates_for_supplier(&self, supplier_id: i64) -> Result<Vec<SupplierRate>, StoreError> {
        let sql = format!(
            "SELECT {SUPPLIER_RATE_COLUMNS} FROM supplier_rates WHERE supplier_id = $1 ORDER BY id DESC"
        );
        let rates = sqlx::query_as::<_, SupplierRate>(&sql)
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rates)
    }

    async fn distinct_prefixes(&self) -> Result<Vec<String>, StoreError> {
        let prefixes: Vec<String> = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT prefix FROM supplier_rates ORDER BY prefix",
        )
        .fetch(&self.pool)
        .try_collect()
        .await?;
        Ok(prefixes)
    }

    async fn rates_for_prefix(&self, prefix: &str) -> Result<Vec<SupplierRate>, StoreError> {
        let sql = format!(
            r#"
            SELECT {SUPPLIER_RATE_COLUMNS}
            FROM supplier_rates
            WHERE prefix = $1
            ORDER BY voice_rate ASC, supplier_id ASC
            "#
        );
        let rates = sqlx::query_as::<_, SupplierRate>(&sql)
            .bind(prefix)
            .fetch_all(&self.pool)
            .await?;
        Ok(rates)
    }
}

#[async_trait]
impl ConsolidatedView for PgRateStore {
    async fn list_consolidated(&self) -> Result<Vec<ConsolidatedRate>, StoreError> {
        let sql = format!("SELECT {CONSOLIDATED_COLUMNS} FROM consolidated_rates ORDER BY prefix");
        let rows = sqlx::query_as::<_, ConsolidatedRate>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn consolidated_by_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<ConsolidatedRate>, StoreError> {
        let sql = format!("SELECT {CONSOLIDATED_COLUMNS} FROM consolidated_rates WHERE prefix = $1");
        let row = sqlx::query_as::<_, ConsolidatedRate>(&sql)
            .bind(prefix)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

#[async_trait]
impl ConsolidatedStore for PgRateStore {
    async fn insert_consolidated(
        &self,
        route: &ConsolidatedRoute,
    ) -> Result<ConsolidatedRate, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO consolidated_rates (
                prefix, country, description,
                primary_supplier_id, primary_rate, backup_supplier_id, backup_rate,
                grace_period, minimal_time, resolution, rate_multiplier, rate_addition,
                surcharge_time, surcharge_amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {CONSOLIDATED_COLUMNS}
            "#
        );
        let row = bind_route(sqlx::query_as::<_, ConsolidatedRate>(&sql), route)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_consolidated(
        &self,
        route: &ConsolidatedRoute,
    ) -> Result<ConsolidatedRate, StoreError> {
        let sql = format!(
            r#"
            UPDATE consolidated_rates SET
                country = $2,
                description = $3,
                primary_supplier_id = $4,
                primary_rate = $5,
                backup_supplier_id = $6,
                backup_rate = $7,
                grace_period = $8,
                minimal_time = $9,
                resolution = $10,
                rate_multiplier = $11,
                rate_addition = $12,
                surcharge_time = $13,
                surcharge_amount = $14
            WHERE prefix = $1
            RETURNING {CONSOLIDATED_COLUMNS}
            "#
        );
        let row = bind_route(sqlx::query_as::<_, ConsolidatedRate>(&sql), route)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn prune_consolidated(&self, keep: &[String]) -> Result<u64, StoreError> {
        let start_time = std::time::Instant::now();
        let result = sqlx::query("DELETE FROM consolidated_rates WHERE prefix <> ALL($1)")
            .bind(keep)
            .execute(&self.pool)
            .await?;
        tracing::debug!(
            "Pruned {} consolidated rows in {:?}",
            result.rows_affected(),
            start_time.elapsed()
        );
        Ok(result.rows_affected())
    }
}

type RouteQuery<'q> =
    sqlx::query::QueryAs<'q, sqlx::Postgres, ConsolidatedRate, sqlx::postgres::PgArguments>;

/// INSERT 与 UPDATE 共用 $1..$14 的参数顺序
fn bind_route<'q>(query: RouteQuery<'q>, route: &'q ConsolidatedRoute) -> RouteQuery<'q> {
    query
        .bind(&route.prefix)
        .bind(&route.country)
        .bind(&route.description)
        .bind(route.primary_supplier_id)
        .bind(&route.primary_rate)
        .bind(route.backup_supplier_id)
        .bind(&route.backup_rate)
        .bind(&route.billing.grace_period)
        .bind(&route.billing.minimal_time)
        .bind(&route.billing.resolution)
        .bind(&route.billing.rate_multiplier)
        .bind(&route.billing.rate_addition)
        .bind(&route.billing.surcharge_time)
        .bind(&route.billing.surcharge_amount)
}
