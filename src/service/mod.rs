pub mod consolidation;
pub mod ingestion;

pub use consolidation::{select_route, ConsolidationEngine};
pub use ingestion::{build_candidate, IngestService};
