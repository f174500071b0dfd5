use catalog_core::{
    CatalogError, CompiledPredicate, Product, ProductId, Result, UpstreamProduct, UpstreamTerm,
};
use catalog_ingest::{Collector, ProductSource};
use catalog_storage::{InMemoryStore, ProductStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct FixedSource(Vec<UpstreamProduct>);

#[async_trait::async_trait]
impl ProductSource for FixedSource {
    async fn fetch_products(&self) -> Result<Vec<UpstreamProduct>> {
        Ok(self.0.clone())
    }
}

struct DownSource;

#[async_trait::async_trait]
impl ProductSource for DownSource {
    async fn fetch_products(&self) -> Result<Vec<UpstreamProduct>> {
        Err(CatalogError::UpstreamFetchFailure("connection refused".into()))
    }
}

/// Accepts `ok_writes` upserts, then fails every later one.
struct FlakyStore {
    inner: InMemoryStore,
    ok_writes: usize,
    attempts: AtomicUsize,
}

#[async_trait::async_trait]
impl ProductStore for FlakyStore {
    async fn upsert(&self, product: Product) -> Result<Product> {
        if self.attempts.fetch_add(1, Ordering::SeqCst) >= self.ok_writes {
            return Err(CatalogError::StorageFailure("disk full".into()));
        }
        self.inner.upsert(product).await
    }
    async fn get(&self, id: ProductId) -> Result<Product> {
        self.inner.get(id).await
    }
    async fn find(&self, predicate: &CompiledPredicate) -> Result<Vec<Product>> {
        self.inner.find(predicate).await
    }
    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
    async fn admin_snapshot(&self) -> Result<(String, usize)> {
        self.inner.admin_snapshot().await
    }
    async fn admin_manifest(&self) -> Result<serde_json::Value> {
        self.inner.admin_manifest().await
    }
}

/// Never completes an upsert.
struct StuckStore;

#[async_trait::async_trait]
impl ProductStore for StuckStore {
    async fn upsert(&self, _product: Product) -> Result<Product> {
        futures::future::pending().await
    }
    async fn get(&self, id: ProductId) -> Result<Product> {
        Err(CatalogError::ProductNotFound(id))
    }
    async fn find(&self, _predicate: &CompiledPredicate) -> Result<Vec<Product>> {
        Ok(vec![])
    }
    async fn count(&self) -> Result<usize> {
        Ok(0)
    }
    async fn admin_snapshot(&self) -> Result<(String, usize)> {
        Err(CatalogError::InvalidRequest("not persistent".into()))
    }
    async fn admin_manifest(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({}))
    }
}

fn term(name: &str) -> UpstreamTerm {
    UpstreamTerm {
        id: None,
        name: name.into(),
        slug: None,
    }
}

fn upstream(id: i64, name: &str, price: f64) -> UpstreamProduct {
    UpstreamProduct {
        id,
        name: name.into(),
        price,
        regular_price: price,
        sale_price: 0.0,
        stock_status: "instock".into(),
        stock_quantity: Some(5),
        categories: vec![term("Electronics"), term("Audio")],
        tags: vec![term("wireless"), term("noise-cancelling")],
        on_sale: false,
        date_created: Some("2023-01-15T10:30:00".into()),
        average_rating: 4.0,
    }
}

#[tokio::test]
async fn ingests_and_normalizes() {
    let store = Arc::new(InMemoryStore::new());
    let source = Arc::new(FixedSource(vec![
        upstream(1, "Headphones", 199.99),
        upstream(2, "Speaker", 49.0),
    ]));
    let products = Collector::new(source, store.clone()).run().await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(store.count().await.unwrap(), 2);
    let p = store.get(1).await.unwrap();
    assert_eq!(p.category.as_deref(), Some("Electronics"));
    assert_eq!(p.tags, vec!["wireless", "noise-cancelling"]);
}

#[tokio::test]
async fn reingesting_same_id_keeps_one_record() {
    let store = Arc::new(InMemoryStore::new());
    Collector::new(Arc::new(FixedSource(vec![upstream(7, "Lamp", 20.0)])), store.clone())
        .run()
        .await
        .unwrap();
    let mut changed = upstream(7, "Lamp XL", 35.0);
    changed.categories.clear();
    Collector::new(Arc::new(FixedSource(vec![changed])), store.clone())
        .run()
        .await
        .unwrap();
    let all = store.all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Lamp XL");
    assert_eq!(all[0].price, 35.0);
    assert_eq!(all[0].category, None);
}

#[tokio::test]
async fn upstream_failure_writes_nothing() {
    let store = Arc::new(InMemoryStore::new());
    let err = Collector::new(Arc::new(DownSource), store.clone())
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::UpstreamFetchFailure(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_record_aborts_before_any_write() {
    let store = Arc::new(InMemoryStore::new());
    let mut bad = upstream(2, "Broken", 1.0);
    bad.date_created = None;
    let err = Collector::new(
        Arc::new(FixedSource(vec![upstream(1, "Fine", 1.0), bad])),
        store.clone(),
    )
    .run()
    .await
    .unwrap_err();
    assert!(matches!(err, CatalogError::UpstreamFetchFailure(_)));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn first_storage_failure_ends_the_run() {
    let store = Arc::new(FlakyStore {
        inner: InMemoryStore::new(),
        ok_writes: 2,
        attempts: AtomicUsize::new(0),
    });
    let source = Arc::new(FixedSource(
        (1..=20).map(|i| upstream(i, "Item", i as f64)).collect(),
    ));
    let err = Collector::new(source, store.clone())
        .with_concurrency(1)
        .run()
        .await
        .unwrap_err();
    assert_eq!(err, CatalogError::StorageFailure("disk full".into()));
    // sequential fan-out stops right after the failing write
    assert_eq!(store.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn stuck_upsert_times_out() {
    let err = Collector::new(
        Arc::new(FixedSource(vec![upstream(9, "Slow", 1.0)])),
        Arc::new(StuckStore),
    )
    .with_storage_timeout(Duration::from_millis(20))
    .run()
    .await
    .unwrap_err();
    assert_eq!(err, CatalogError::Timeout("upsert of product 9".into()));
}

/// Records the highest number of upserts in flight at once.
#[derive(Default)]
struct GaugedStore {
    inner: InMemoryStore,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait::async_trait]
impl ProductStore for GaugedStore {
    async fn upsert(&self, product: Product) -> Result<Product> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let res = self.inner.upsert(product).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res
    }
    async fn get(&self, id: ProductId) -> Result<Product> {
        self.inner.get(id).await
    }
    async fn find(&self, predicate: &CompiledPredicate) -> Result<Vec<Product>> {
        self.inner.find(predicate).await
    }
    async fn count(&self) -> Result<usize> {
        self.inner.count().await
    }
    async fn admin_snapshot(&self) -> Result<(String, usize)> {
        self.inner.admin_snapshot().await
    }
    async fn admin_manifest(&self) -> Result<serde_json::Value> {
        self.inner.admin_manifest().await
    }
}

#[tokio::test]
async fn upserts_never_exceed_concurrency_limit() {
    let store = Arc::new(GaugedStore::default());
    let source = Arc::new(FixedSource(
        (1..=12).map(|i| upstream(i, "Item", i as f64)).collect(),
    ));
    Collector::new(source, store.clone())
        .with_concurrency(3)
        .run()
        .await
        .unwrap();
    assert_eq!(store.count().await.unwrap(), 12);
    assert_eq!(store.peak.load(Ordering::SeqCst), 3);
    assert_eq!(store.in_flight.load(Ordering::SeqCst), 0);
}
