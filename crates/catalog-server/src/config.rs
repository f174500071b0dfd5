use anyhow::{Context, Result};
use catalog_ingest::WooCommerceConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Runtime configuration, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    pub upstream: Option<WooCommerceConfig>,
    /// Zero disables the periodic ingestion task.
    pub ingest_interval: Duration,
    pub ingest_concurrency: usize,
    pub storage_timeout: Duration,
    pub tls: Option<(PathBuf, PathBuf)>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());
        let upstream_timeout = Duration::from_secs(parse_or(&get, "UPSTREAM_TIMEOUT_SECS", 30)?);
        let upstream = match get("WOOCOMMERCE_BASE_URL") {
            Some(base_url) => Some(WooCommerceConfig {
                base_url,
                consumer_key: get("WOOCOMMERCE_CONSUMER_KEY").unwrap_or_default(),
                consumer_secret: get("WOOCOMMERCE_CONSUMER_SECRET").unwrap_or_default(),
                timeout: upstream_timeout,
            }),
            None => None,
        };
        let tls = match (get("TLS_CERT_PATH"), get("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            _ => None,
        };
        Ok(Self {
            port: parse_or(&get, "PORT", 5000)?,
            data_dir: get("DATA_DIR").map(PathBuf::from),
            upstream,
            ingest_interval: Duration::from_secs(parse_or(&get, "INGEST_INTERVAL_SECS", 300)?),
            ingest_concurrency: parse_or(&get, "INGEST_CONCURRENCY", 8)?,
            storage_timeout: Duration::from_secs(parse_or(&get, "STORAGE_TIMEOUT_SECS", 5)?),
            tls,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: '{}'", key, v)),
        None => Ok(default),
    }
}
