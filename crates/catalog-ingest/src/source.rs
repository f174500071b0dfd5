use catalog_core::{CatalogError, Result, UpstreamProduct};
use std::time::Duration;
use tracing::info;

/// Where raw product records come from.
#[async_trait::async_trait]
pub trait ProductSource: Send + Sync + 'static {
    async fn fetch_products(&self) -> Result<Vec<UpstreamProduct>>;
}

#[derive(Debug, Clone)]
pub struct WooCommerceConfig {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub timeout: Duration,
}

/// WooCommerce REST client for `GET /wp-json/wc/v3/products`.
pub struct WooCommerceSource {
    client: reqwest::Client,
    config: WooCommerceConfig,
}

impl WooCommerceSource {
    pub fn new(mut config: WooCommerceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::UpstreamFetchFailure(e.to_string()))?;
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self { client, config })
    }

    fn products_url(&self) -> String {
        format!("{}/wp-json/wc/v3/products", self.config.base_url)
    }
}

fn request_err(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout("upstream fetch".into())
    } else {
        CatalogError::UpstreamFetchFailure(e.to_string())
    }
}

#[async_trait::async_trait]
impl ProductSource for WooCommerceSource {
    async fn fetch_products(&self) -> Result<Vec<UpstreamProduct>> {
        let url = self.products_url();
        info!(url = %url, "fetching upstream products");
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("consumer_key", self.config.consumer_key.as_str()),
                ("consumer_secret", self.config.consumer_secret.as_str()),
            ])
            .send()
            .await
            .map_err(request_err)?;
        let status = resp.status();
        let body = resp.text().await.map_err(request_err)?;
        if !status.is_success() {
            return Err(CatalogError::UpstreamFetchFailure(format!(
                "upstream returned {}: {}",
                status.as_u16(),
                body
            )));
        }
        let products: Vec<UpstreamProduct> = serde_json::from_str(&body).map_err(|e| {
            CatalogError::UpstreamFetchFailure(format!("invalid product payload: {}", e))
        })?;
        info!(count = products.len(), "fetched upstream products");
        Ok(products)
    }
}
