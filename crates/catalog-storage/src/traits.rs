use catalog_core::{CompiledPredicate, Product, ProductId, Result};

/// Document store for products, keyed by external product id.
#[async_trait::async_trait]
pub trait ProductStore: Send + Sync + 'static {
    /// Insert or fully replace the product with the same id.
    async fn upsert(&self, product: Product) -> Result<Product>;
    async fn get(&self, id: ProductId) -> Result<Product>;
    /// Products matching every constraint, ordered by id.
    async fn find(&self, predicate: &CompiledPredicate) -> Result<Vec<Product>>;
    async fn count(&self) -> Result<usize>;

    async fn all(&self) -> Result<Vec<Product>> {
        self.find(&CompiledPredicate::default()).await
    }

    // Admin
    async fn admin_snapshot(&self) -> Result<(String, usize)>;
    async fn admin_manifest(&self) -> Result<serde_json::Value>;
}
