use crate::traits::ProductStore;
use catalog_core::{CatalogError, CompiledPredicate, Product, ProductId, Result};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    // id -> latest version; BTreeMap keeps scans ordered by id
    data: BTreeMap<ProductId, Product>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp and store `product`, replacing any previous record with its id.
    pub fn apply_upsert(&self, mut product: Product) -> Product {
        product.updated_at = Some(Utc::now());
        self.inner.write().data.insert(product.id, product.clone());
        product
    }

    /// Restore a record exactly as persisted (no restamping).
    pub fn replay_upsert(&self, product: Product) {
        self.inner.write().data.insert(product.id, product);
    }

    pub fn all_products(&self) -> Vec<Product> {
        self.inner.read().data.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ProductStore for InMemoryStore {
    async fn upsert(&self, product: Product) -> Result<Product> {
        Ok(self.apply_upsert(product))
    }

    async fn get(&self, id: ProductId) -> Result<Product> {
        self.inner
            .read()
            .data
            .get(&id)
            .cloned()
            .ok_or(CatalogError::ProductNotFound(id))
    }

    async fn find(&self, predicate: &CompiledPredicate) -> Result<Vec<Product>> {
        let inner = self.inner.read();
        Ok(inner
            .data
            .values()
            .filter(|p| predicate.matches(p))
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.len())
    }

    async fn admin_snapshot(&self) -> Result<(String, usize)> {
        Err(CatalogError::InvalidRequest("not persistent".into()))
    }

    async fn admin_manifest(&self) -> Result<serde_json::Value> {
        Ok(serde_json::json!({"mode": "memory", "products": self.len()}))
    }
}
