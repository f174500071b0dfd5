pub mod config;
pub mod metrics;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use catalog_core::FieldRegistry;
use catalog_ingest::Collector;
use catalog_storage::ProductStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    // None when no upstream is configured
    pub collector: Option<Collector>,
    pub registry: &'static FieldRegistry,
    pub storage_timeout: Duration,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/products", get(routes::list_products))
        .route("/products/ingest", get(routes::ingest).post(routes::ingest))
        .route("/products/:id", get(routes::get_product))
        .route("/segments/evaluate", post(routes::evaluate_segment))
        .route("/segments/explain", post(routes::explain_segment))
        .route("/segments/fields", get(routes::segment_fields))
        .route("/admin/snapshot", post(routes::admin_snapshot))
        .route("/admin/manifest", get(routes::admin_manifest))
        .route("/metrics", get(routes::metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Run `collector` every `period`, first run one period after start.
/// A failed run is logged and counted; the next run starts fresh.
pub fn spawn_periodic_ingestion(collector: Collector, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(period_secs = period.as_secs(), "periodic ingestion scheduled");
        loop {
            ticker.tick().await;
            info!("running scheduled product ingestion");
            let res = collector.run().await;
            metrics::INGEST_RUNS_TOTAL
                .with_label_values(&["scheduled", metrics::result_label(&res)])
                .inc();
            if let Ok(products) = res {
                metrics::INGEST_LAST_PRODUCTS.set(products.len() as f64);
            }
        }
    })
}
