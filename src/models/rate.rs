use crate::error::StoreError;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// 计费参数 (原样透传, 核心逻辑不解析)
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BillingTerms {
    pub grace_period: Option<String>,
    pub minimal_time: Option<String>,
    pub resolution: Option<String>,
    pub rate_multiplier: Option<String>,
    pub rate_addition: Option<String>,
    pub surcharge_time: Option<String>,
    pub surcharge_amount: Option<String>,
}

impl BillingTerms {
    /// 缺失的计费参数补默认值 (VoipSwitch 可直接导入)
    pub fn fill_defaults(&mut self) {
        fill_default(&mut self.grace_period, "0");
        fill_default(&mut self.minimal_time, "0");
        fill_default(&mut self.resolution, "1");
        fill_default(&mut self.rate_multiplier, "1.0");
        fill_default(&mut self.rate_addition, "0.0");
        fill_default(&mut self.surcharge_time, "0");
        fill_default(&mut self.surcharge_amount, "0.0");
    }
}

fn fill_default(slot: &mut Option<String>, value: &str) {
    if slot.as_deref().map_or(true, |v| v.trim().is_empty()) {
        *slot = Some(value.to_string());
    }
}

/// 供应商费率 (supplier_rates)
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SupplierRate {
    pub id: i64,
    pub supplier_id: i64,
    pub prefix: String,
    pub description: Option<String>,
    pub country: Option<String>,
    pub voice_rate: BigDecimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub billing: BillingTerms,
    pub time_from_day: Option<String>,
    pub time_to_day: Option<String>,
    pub time_from_hour: Option<String>,
    pub time_to_hour: Option<String>,
    pub is_sms: Option<String>,
    pub effective_date: Option<String>,
    pub comments: Option<String>,
    pub round_rules: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 待写入的费率记录, 字段保持导入时的原始文本
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplierRate {
    pub supplier_id: i64,
    pub prefix: String,
    pub description: Option<String>,
    pub country: Option<String>,
    pub voice_rate: String,
    #[serde(flatten)]
    pub billing: BillingTerms,
    pub time_from_day: Option<String>,
    pub time_to_day: Option<String>,
    pub time_from_hour: Option<String>,
    pub time_to_hour: Option<String>,
    pub is_sms: Option<String>,
    pub effective_date: Option<String>,
    pub comments: Option<String>,
    pub round_rules: Option<String>,
}

impl NewSupplierRate {
    pub fn new(supplier_id: i64, prefix: impl Into<String>, voice_rate: impl Into<String>) -> Self {
        Self {
            supplier_id,
            prefix: prefix.into(),
            voice_rate: voice_rate.into(),
            ..Default::default()
        }
    }

    /// 写入前校验: prefix 非空且为合法文本, voice_rate 为非负十进制数
    pub fn validate(&self) -> Result<BigDecimal, StoreError> {
        let prefix = self.prefix.trim();
        if prefix.is_empty() {
            return Err(StoreError::EmptyPrefix);
        }
        // 非 UTF-8 字节经有损解码后留下的替换字符
        if prefix.contains(char::REPLACEMENT_CHARACTER) {
            return Err(StoreError::InvalidPrefix(prefix.to_string()));
        }
        parse_voice_rate(&self.prefix, &self.voice_rate)
    }

    /// 实际写入的记录: 计费参数和 is_sms 补默认值
    pub fn with_defaults(&self) -> Self {
        let mut rate = self.clone();
        rate.billing.fill_defaults();
        fill_default(&mut rate.is_sms, "0");
        rate
    }
}

/// 解析 voice_rate, 拒绝非数字和负数
pub fn parse_voice_rate(prefix: &str, raw: &str) -> Result<BigDecimal, StoreError> {
    let invalid = || StoreError::InvalidRate {
        prefix: prefix.to_string(),
        value: raw.to_string(),
    };

    let rate = BigDecimal::from_str(raw.trim()).map_err(|_| invalid())?;
    if rate < BigDecimal::zero() {
        return Err(invalid());
    }
    Ok(rate)
}
