pub mod memory;
pub mod pool;
pub mod postgres;
pub mod store;

pub use memory::MemoryRateStore;
pub use pool::{create_pool, run_migrations};
pub use postgres::PgRateStore;
pub use store::{ConsolidatedStore, ConsolidatedView, RateStore, TariffStore};
