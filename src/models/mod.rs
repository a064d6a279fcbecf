pub mod consolidated;
pub mod rate;
pub mod report;
pub mod supplier;

pub use consolidated::{ConsolidatedRate, ConsolidatedRoute};
pub use rate::{parse_voice_rate, BillingTerms, NewSupplierRate, SupplierRate};
pub use report::{IngestReport, IngestStatus, ReconcileReport, RowError};
pub use supplier::Supplier;
