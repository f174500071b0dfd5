use crate::source::ProductSource;
use catalog_core::{CatalogError, Product, Result, UpstreamProduct};
use catalog_storage::ProductStore;
use futures::{stream, TryStreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

pub const DEFAULT_CONCURRENCY: usize = 8;
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// One ingestion pass: fetch, normalize, upsert by id.
///
/// Every record is normalized before the first write, so a malformed payload
/// leaves storage untouched. Upserts run with bounded concurrency and the
/// first failed upsert ends the run; writes already applied are kept.
#[derive(Clone)]
pub struct Collector {
    source: Arc<dyn ProductSource>,
    store: Arc<dyn ProductStore>,
    concurrency: usize,
    storage_timeout: Duration,
}

impl Collector {
    pub fn new(source: Arc<dyn ProductSource>, store: Arc<dyn ProductStore>) -> Self {
        Self {
            source,
            store,
            concurrency: DEFAULT_CONCURRENCY,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    pub async fn run(&self) -> Result<Vec<Product>> {
        let started = Instant::now();
        match self.run_inner().await {
            Ok(products) => {
                info!(
                    count = products.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "ingestion run complete"
                );
                Ok(products)
            }
            Err(e) => {
                error!(error = %e, "ingestion run failed");
                Err(e)
            }
        }
    }

    async fn run_inner(&self) -> Result<Vec<Product>> {
        let raw = self.source.fetch_products().await?;
        let products = raw
            .into_iter()
            .map(UpstreamProduct::normalize)
            .collect::<Result<Vec<_>>>()?;

        let timeout = self.storage_timeout;
        stream::iter(products.iter().cloned().map(Ok::<_, CatalogError>))
            .try_for_each_concurrent(self.concurrency, |product| {
                let store = self.store.clone();
                async move {
                    let id = product.id;
                    match tokio::time::timeout(timeout, store.upsert(product)).await {
                        Ok(res) => res.map(|_| ()),
                        Err(_) => Err(CatalogError::Timeout(format!("upsert of product {}", id))),
                    }
                }
            })
            .await?;
        Ok(products)
    }
}
