use anyhow::Context;
use catalog_core::PRODUCT_FIELDS;
use catalog_ingest::{Collector, WooCommerceSource};
use catalog_server::{config::Config, router, spawn_periodic_ingestion, AppState};
use catalog_storage::{InMemoryStore, PersistentStore, ProductStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn ProductStore> = match &config.data_dir {
        Some(dir) => match PersistentStore::open(dir.clone()) {
            Ok(p) => Arc::new(p),
            Err(e) => {
                warn!(error = %e, "persistent open failed, falling back to memory");
                Arc::new(InMemoryStore::new())
            }
        },
        None => Arc::new(InMemoryStore::new()),
    };

    let collector = match &config.upstream {
        Some(upstream) => {
            let source = WooCommerceSource::new(upstream.clone())?;
            Some(
                Collector::new(Arc::new(source), store.clone())
                    .with_concurrency(config.ingest_concurrency)
                    .with_storage_timeout(config.storage_timeout),
            )
        }
        None => {
            warn!("WOOCOMMERCE_BASE_URL not set; ingestion disabled");
            None
        }
    };

    if let Some(c) = &collector {
        if !config.ingest_interval.is_zero() {
            spawn_periodic_ingestion(c.clone(), config.ingest_interval);
        }
    }

    let state = AppState {
        store,
        collector,
        registry: &PRODUCT_FIELDS,
        storage_timeout: config.storage_timeout,
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("http listening on {}", addr);
    match &config.tls {
        Some((cert, key)) => {
            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert, key)
                .await
                .context("loading TLS certificate")?;
            axum_server::bind_rustls(addr, tls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}
