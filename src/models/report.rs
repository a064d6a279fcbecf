use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 导入结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    /// 至少导入了一行
    Imported,
    /// 文件中没有任何可作为表头的行
    NoHeader,
    /// 找到表头, 但没有一行被成功写入
    NoValidRows,
}

/// 单行写入失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 文件中的行号 (1-based)
    pub row: usize,
    pub record: IndexMap<String, String>,
    pub reason: String,
}

/// 导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub supplier_id: i64,
    pub status: IngestStatus,
    pub imported: usize,
    pub header_line: Option<usize>,
    pub headers: Vec<String>,
    pub errors: Vec<RowError>,
}

impl IngestReport {
    pub fn no_header(supplier_id: i64) -> Self {
        Self {
            supplier_id,
            status: IngestStatus::NoHeader,
            imported: 0,
            header_line: None,
            headers: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn message(&self) -> String {
        match self.status {
            IngestStatus::Imported => format!(
                "Imported {} rates ({} rows failed)",
                self.imported,
                self.errors.len()
            ),
            IngestStatus::NoHeader => "No valid header found in CSV file.".to_string(),
            IngestStatus::NoValidRows => {
                "No valid rates were imported. Please check your CSV file format.".to_string()
            }
        }
    }
}

/// 汇总运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub prefixes_processed: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub pruned: u64,
}
