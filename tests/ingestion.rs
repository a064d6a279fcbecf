use std::io::Write;
use std::sync::Arc;
use tariff_consolidator::db::RateStore;
use tariff_consolidator::models::IngestStatus;
use tariff_consolidator::{IngestError, IngestService, MemoryRateStore};

fn service(store: &Arc<MemoryRateStore>) -> IngestService {
    IngestService::new(store.clone(), "Ksh")
}

#[tokio::test]
async fn header_after_blank_preamble() {
    let store = Arc::new(MemoryRateStore::new());
    let file = ",,\n\nDestination,Numbering plan,Rates per minute\nKenya,254,0.02\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "Safaricom")
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::Imported);
    assert_eq!(report.imported, 1);
    assert!(report.errors.is_empty());
    assert_eq!(report.header_line, Some(3));

    let rates = store.rates_for_supplier(report.supplier_id).await.unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].description.as_deref(), Some("Kenya"));
    assert_eq!(rates[0].prefix, "254");
    assert_eq!(rates[0].voice_rate.to_string(), "0.02");
    assert_eq!(rates[0].country, None);
}

#[tokio::test]
async fn row_without_rate_is_skipped_silently() {
    let store = Arc::new(MemoryRateStore::new());
    let file = "Destination,Numbering plan,Rates per minute\nKenya,254,\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "Airtel")
        .await
        .unwrap();

    assert_eq!(report.imported, 0);
    assert!(report.errors.is_empty());
    assert_eq!(report.status, IngestStatus::NoValidRows);
}

#[tokio::test]
async fn blank_file_reports_missing_header() {
    let store = Arc::new(MemoryRateStore::new());

    let report = service(&store)
        .ingest_bytes(b"\n , ,\n\n", "Airtel")
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::NoHeader);
    assert_eq!(report.imported, 0);
    assert!(report.errors.is_empty());
    assert_eq!(report.header_line, None);
    assert_ne!(report.message(), "");
}

#[tokio::test]
async fn invalid_rate_is_recorded_and_batch_continues() {
    let store = Arc::new(MemoryRateStore::new());
    let file = "destination,prefix,rate\nKenya,254,abc\nUganda,256,0.04\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "Telkom")
        .await
        .unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(report.errors.len(), 1);
    let error = &report.errors[0];
    assert_eq!(error.row, 2);
    assert_eq!(error.record["prefix"], "254");
    assert_eq!(error.record["rate"], "abc");
    assert!(error.reason.contains("invalid voice rate"));
}

#[tokio::test]
async fn store_failure_on_one_row_does_not_abort() {
    let store = Arc::new(MemoryRateStore::new());
    store.fail_writes_for("255").await;
    let file = "prefix,rate\n254,0.1\n255,0.2\n256,0.3\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "Liquid")
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::Imported);
    assert_eq!(report.imported, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
}

#[tokio::test]
async fn only_failed_rows_yield_no_valid_rows_with_errors() {
    let store = Arc::new(MemoryRateStore::new());
    let file = "prefix,rate\n254,-1\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "Liquid")
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::NoValidRows);
    assert_eq!(report.imported, 0);
    assert_eq!(report.errors.len(), 1);
}

#[tokio::test]
async fn supplier_is_found_or_created_by_exact_name() {
    let store = Arc::new(MemoryRateStore::new());
    let ingest = service(&store);
    let file = b"prefix,rate\n254,0.1\n";

    let first = ingest.ingest_bytes(file, "Safaricom").await.unwrap();
    let again = ingest.ingest_bytes(file, "Safaricom").await.unwrap();
    let other_case = ingest.ingest_bytes(file, "safaricom").await.unwrap();

    assert_eq!(first.supplier_id, again.supplier_id);
    assert_ne!(first.supplier_id, other_case.supplier_id);

    let supplier = store.supplier_by_name("Safaricom").await.unwrap().unwrap();
    assert_eq!(supplier.currency, "Ksh");
}

#[tokio::test]
async fn reimport_replaces_supplier_quote() {
    let store = Arc::new(MemoryRateStore::new());
    let ingest = service(&store);

    let first = ingest
        .ingest_bytes(b"prefix,rate\n254,0.10\n", "Safaricom")
        .await
        .unwrap();
    ingest
        .ingest_bytes(b"prefix,rate,notes\n254,0.08,cheaper\n", "Safaricom")
        .await
        .unwrap();

    let rates = store.rates_for_supplier(first.supplier_id).await.unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].voice_rate.to_string(), "0.08");
    assert_eq!(rates[0].comments.as_deref(), Some("cheaper"));
}

#[tokio::test]
async fn optional_fields_resolve_through_synonyms() {
    let store = Arc::new(MemoryRateStore::new());
    let file = "Code,Voice Rate,Destination Name,Grace Period,Minimal Time,Resolution,Additional Rate,SMS,Effective Date\n\
                44, 0.05 ,United Kingdom,5,30,60,0.01,0,2024-01-01\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "BT")
        .await
        .unwrap();
    assert_eq!(report.imported, 1);

    let rate = &store.rates_for_prefix("44").await.unwrap()[0];
    assert_eq!(rate.description.as_deref(), Some("United Kingdom"));
    assert_eq!(rate.billing.grace_period.as_deref(), Some("5"));
    assert_eq!(rate.billing.minimal_time.as_deref(), Some("30"));
    assert_eq!(rate.billing.resolution.as_deref(), Some("60"));
    assert_eq!(rate.billing.rate_addition.as_deref(), Some("0.01"));
    assert_eq!(rate.is_sms.as_deref(), Some("0"));
    assert_eq!(rate.effective_date.as_deref(), Some("2024-01-01"));
    assert_eq!(rate.billing.surcharge_amount.as_deref(), Some("0.0"));
    assert_eq!(rate.comments, None);
}

#[tokio::test]
async fn ingests_from_file_on_disk() {
    let store = Arc::new(MemoryRateStore::new());
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"prefix,rate\r\n254,0.02\r\n256,0.03\r\n").unwrap();

    let report = service(&store)
        .ingest_file(file.path(), "Safaricom")
        .await
        .unwrap();

    assert_eq!(report.imported, 2);
}

#[tokio::test]
async fn unreadable_file_is_a_hard_failure() {
    let store = Arc::new(MemoryRateStore::new());
    let dir = tempfile::tempdir().unwrap();

    let result = service(&store)
        .ingest_file(&dir.path().join("missing.csv"), "Safaricom")
        .await;

    assert!(matches!(result, Err(IngestError::Io(_))));
}

#[tokio::test]
async fn unterminated_quote_does_not_swallow_later_rows() {
    let store = Arc::new(MemoryRateStore::new());
    let file = "prefix,rate,description\n254,0.1,\"Kenya\n255,0.2,Tz\n256,0.3,Ug\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "Liquid")
        .await
        .unwrap();

    assert_eq!(report.status, IngestStatus::Imported);
    assert_eq!(report.imported, 2);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert!(report.errors[0].reason.contains("unterminated"));

    let prefixes = store.distinct_prefixes().await.unwrap();
    assert_eq!(prefixes, vec!["255", "256"]);
    let tz = &store.rates_for_prefix("255").await.unwrap()[0];
    assert_eq!(tz.description.as_deref(), Some("Tz"));
}

#[tokio::test]
async fn repeated_prefix_in_one_sheet_counts_once() {
    let store = Arc::new(MemoryRateStore::new());
    let file = "prefix,rate\n254,0.1\n254,0.2\n";

    let report = service(&store)
        .ingest_bytes(file.as_bytes(), "Liquid")
        .await
        .unwrap();

    assert_eq!(report.imported, 1);
    assert!(report.errors.is_empty());
    let rates = store.rates_for_supplier(report.supplier_id).await.unwrap();
    assert_eq!(rates.len(), 1);
    assert_eq!(rates[0].voice_rate.to_string(), "0.2");
}

#[tokio::test]
async fn undecodable_prefix_is_a_row_error() {
    let store = Arc::new(MemoryRateStore::new());
    let file = b"prefix,rate\n\xff2,0.1\n254,0.2\n";

    let report = service(&store).ingest_bytes(file, "Liquid").await.unwrap();

    assert_eq!(report.imported, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 2);
    assert!(report.errors[0].reason.contains("undecodable"));
    assert_eq!(store.distinct_prefixes().await.unwrap(), vec!["254"]);
}

#[tokio::test]
async fn create_supplier_returns_existing_name() {
    let store = MemoryRateStore::new();

    let first = store.create_supplier("Safaricom", "Ksh").await.unwrap();
    let second = store.create_supplier("Safaricom", "USD").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.currency, "Ksh");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_imports_share_one_new_supplier() {
    let store = Arc::new(MemoryRateStore::new());
    let ingest = Arc::new(service(&store));

    let mut handles = Vec::new();
    for idx in 0..8 {
        let ingest = ingest.clone();
        handles.push(tokio::spawn(async move {
            let file = format!("prefix,rate\n25{idx},0.1\n");
            ingest.ingest_bytes(file.as_bytes(), "Airtel").await.unwrap()
        }));
    }

    let mut supplier_ids = Vec::new();
    for handle in handles {
        supplier_ids.push(handle.await.unwrap().supplier_id);
    }
    supplier_ids.dedup();
    assert_eq!(supplier_ids.len(), 1);

    let rates = store.rates_for_supplier(supplier_ids[0]).await.unwrap();
    assert_eq!(rates.len(), 8);
}
