pub mod handlers;

pub use handlers::*;

use crate::db::{ConsolidatedView, RateStore};
use crate::service::{ConsolidationEngine, IngestService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub ingest: Arc<IngestService>,
    pub engine: Arc<ConsolidationEngine>,
    pub rates: Arc<dyn RateStore>,
    pub consolidated: Arc<dyn ConsolidatedView>,
    pub max_upload_bytes: usize,
}

/// 构建全部路由
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    let supplier_rate_routes = Router::new()
        .route("/api/supplier-rates/import", post(import_rates))
        .route(
            "/api/supplier-rates/supplier/:supplier_id",
            get(rates_for_supplier),
        )
        .route("/api/supplier-rates/:id", delete(delete_rate))
        .layer(DefaultBodyLimit::max(body_limit));

    let consolidated_routes = Router::new()
        .route("/api/consolidated-rates", get(list_consolidated))
        .route("/api/consolidated-rates/generate", post(generate_consolidated))
        .route("/api/consolidated-rates/export", get(export_consolidated))
        .route(
            "/api/consolidated-rates/prefix/:prefix",
            get(consolidated_by_prefix),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(supplier_rate_routes)
        .merge(consolidated_routes)
        .with_state(state)
}
