use super::header::locate_header;
use csv::{ReaderBuilder, StringRecord, Trim};
use indexmap::IndexMap;

/// 一行数据: 规范化列名 -> 原始值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRow {
    /// 文件中的行号 (1-based)
    pub row: usize,
    pub record: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Decoded(DecodedRow),
    /// CSV 结构错误, 只影响该行
    Malformed { row: usize, reason: String },
}

/// 定位表头之后的费率表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSheet {
    pub header_line: usize,
    pub headers: Vec<String>,
    pub rows: Vec<RowOutcome>,
}

fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').trim().to_lowercase()
}

/// 单独解析一个物理行; 引号不闭合的行不会吞掉后续行
fn decode_line(line: &str) -> Result<StringRecord, String> {
    if line.matches('"').count() % 2 != 0 {
        return Err("unterminated quoted field".to_string());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(e)) => Err(e.to_string()),
        None => Ok(StringRecord::new()),
    }
}

/// 解析整份文件内容; 没有表头行时返回 None
pub fn decode_rows(text: &str) -> Option<RateSheet> {
    let text = text.trim_start_matches('\u{feff}');
    let lines: Vec<&str> = text.lines().collect();
    let header_line = locate_header(&lines)?;

    let headers: Vec<String> = match decode_line(lines[header_line - 1]) {
        Ok(record) => record.iter().map(normalize_header).collect(),
        Err(reason) => {
            tracing::warn!("Header line {} could not be decoded: {}", header_line, reason);
            return None;
        }
    };

    let mut rows = Vec::new();
    for (offset, line) in lines[header_line..].iter().enumerate() {
        let row = header_line + offset + 1;
        let record = match decode_line(line) {
            Ok(record) => record,
            Err(reason) => {
                rows.push(RowOutcome::Malformed { row, reason });
                continue;
            }
        };
        if record.iter().all(|value| value.is_empty()) {
            continue;
        }

        // 列名重复时后出现的列生效
        let mut mapped = IndexMap::with_capacity(headers.len());
        for (key, value) in headers.iter().zip(record.iter()) {
            if key.is_empty() {
                continue;
            }
            mapped.insert(key.clone(), value.to_string());
        }
        rows.push(RowOutcome::Decoded(DecodedRow {
            row,
            record: mapped,
        }));
    }

    Some(RateSheet {
        header_line,
        headers,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(sheet: &RateSheet) -> Vec<&DecodedRow> {
        sheet
            .rows
            .iter()
            .filter_map(|r| match r {
                RowOutcome::Decoded(row) => Some(row),
                RowOutcome::Malformed { .. } => None,
            })
            .collect()
    }

    #[test]
    fn headers_are_lowercased_and_trimmed() {
        let sheet = decode_rows(" Destination , Numbering Plan ,RATES PER MINUTE\nKenya,254,0.02\n").unwrap();
        assert_eq!(
            sheet.headers,
            vec!["destination", "numbering plan", "rates per minute"]
        );
        let rows = decoded(&sheet);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record["numbering plan"], "254");
    }

    #[test]
    fn row_numbers_follow_the_file() {
        let text = "\n,,\nprefix,rate\r\n254,0.02\r\n256,0.03\r\n";
        let sheet = decode_rows(text).unwrap();
        assert_eq!(sheet.header_line, 3);
        let rows = decoded(&sheet);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 4);
        assert_eq!(rows[1].row, 5);
    }

    #[test]
    fn comma_only_rows_are_dropped() {
        let sheet = decode_rows("prefix,rate\n,,\n254,0.1\n").unwrap();
        assert_eq!(decoded(&sheet).len(), 1);
    }

    #[test]
    fn short_rows_keep_present_columns() {
        let sheet = decode_rows("destination,prefix,rate\nKenya,254\n").unwrap();
        let rows = decoded(&sheet);
        assert_eq!(rows[0].record.get("rate"), None);
        assert_eq!(rows[0].record["prefix"], "254");
    }

    #[test]
    fn strips_byte_order_mark() {
        let sheet = decode_rows("\u{feff}Prefix,Rate\n1,2\n").unwrap();
        assert_eq!(sheet.headers[0], "prefix");
    }

    #[test]
    fn blank_file_has_no_sheet() {
        assert!(decode_rows("").is_none());
        assert!(decode_rows("\n , \n,,,\n").is_none());
    }

    #[test]
    fn unterminated_quote_only_affects_its_line() {
        let text = "prefix,rate,description\n254,0.1,\"Kenya\n255,0.2,Tz\n256,0.3,\"Uganda\"\n";
        let sheet = decode_rows(text).unwrap();
        assert_eq!(sheet.rows.len(), 3);
        assert!(matches!(
            &sheet.rows[0],
            RowOutcome::Malformed { row: 2, .. }
        ));
        let rows = decoded(&sheet);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row, 3);
        assert_eq!(rows[0].record["description"], "Tz");
        assert_eq!(rows[1].record["prefix"], "256");
        assert_eq!(rows[1].record["description"], "Uganda");
    }

    #[test]
    fn quoted_commas_stay_in_one_field() {
        let sheet = decode_rows("prefix,description,rate\n254,\"Kenya, Mobile\",0.1\n").unwrap();
        let rows = decoded(&sheet);
        assert_eq!(rows[0].record["description"], "Kenya, Mobile");
        assert_eq!(rows[0].record["rate"], "0.1");
    }

    #[test]
    fn duplicate_header_keeps_last_column() {
        let sheet = decode_rows("prefix,rate,rate\n254,0.1,0.2\n").unwrap();
        let rows = decoded(&sheet);
        assert_eq!(rows[0].record.len(), 2);
        assert_eq!(rows[0].record["rate"], "0.2");
    }
}
