pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod parsing;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, run_migrations, MemoryRateStore, PgRateStore};
pub use error::{IngestError, ReconcileError, StoreError};
pub use service::{ConsolidationEngine, IngestService};
