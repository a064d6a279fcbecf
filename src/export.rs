use crate::models::ConsolidatedRate;
use csv::Writer;
use std::io::Write;

/// 导出字段 (固定顺序, 兼容 VoipSwitch 导入)
pub const EXPORT_FIELDS: [&str; 15] = [
    "prefix",
    "country",
    "description",
    "primary_supplier_id",
    "primary_rate",
    "backup_supplier_id",
    "backup_rate",
    "grace_period",
    "minimal_time",
    "resolution",
    "rate_multiplier",
    "rate_addition",
    "surcharge_time",
    "surcharge_amount",
    "created_at",
];

/// 将 Option 转换为 CSV 字符串, None 输出为空
fn option_to_csv<T: ToString>(val: &Option<T>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// 写出汇总表 CSV (含表头)
pub fn write_consolidated_csv<W: Write>(
    rates: &[ConsolidatedRate],
    output: W,
) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(EXPORT_FIELDS)?;

    for rate in rates {
        writer.write_record(&[
            rate.prefix.clone(),
            option_to_csv(&rate.country),
            option_to_csv(&rate.description),
            rate.primary_supplier_id.to_string(),
            rate.primary_rate.to_string(),
            option_to_csv(&rate.backup_supplier_id),
            option_to_csv(&rate.backup_rate),
            option_to_csv(&rate.billing.grace_period),
            option_to_csv(&rate.billing.minimal_time),
            option_to_csv(&rate.billing.resolution),
            option_to_csv(&rate.billing.rate_multiplier),
            option_to_csv(&rate.billing.rate_addition),
            option_to_csv(&rate.billing.surcharge_time),
            option_to_csv(&rate.billing.surcharge_amount),
            rate.created_at.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn consolidated_csv_bytes(rates: &[ConsolidatedRate]) -> Result<Vec<u8>, csv::Error> {
    let mut buffer = Vec::new();
    write_consolidated_csv(rates, &mut buffer)?;
    Ok(buffer)
}
