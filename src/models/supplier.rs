use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 供应商 (suppliers)
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}
