//! Raw product records as served by the WooCommerce REST API (`wc/v3`).

use crate::errors::{CatalogError, Result};
use crate::model::{Product, ProductId};
use chrono::{DateTime, Duration, Local, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UpstreamTerm {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UpstreamProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default, deserialize_with = "decimal")]
    pub price: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub regular_price: f64,
    #[serde(default, deserialize_with = "decimal")]
    pub sale_price: f64,
    #[serde(default)]
    pub stock_status: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub categories: Vec<UpstreamTerm>,
    #[serde(default)]
    pub tags: Vec<UpstreamTerm>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default, deserialize_with = "decimal")]
    pub average_rating: f64,
}

impl UpstreamProduct {
    pub fn normalize(self) -> Result<Product> {
        let created_at = self
            .date_created
            .as_deref()
            .and_then(parse_upstream_timestamp)
            .ok_or_else(|| {
                CatalogError::UpstreamFetchFailure(format!(
                    "product {} has no usable date_created ({:?})",
                    self.id, self.date_created
                ))
            })?;
        Ok(Product {
            id: self.id,
            title: self.name,
            price: self.price,
            regular_price: self.regular_price,
            sale_price: self.sale_price,
            stock_status: self.stock_status,
            stock_quantity: self.stock_quantity,
            category: self.categories.into_iter().next().map(|c| c.name),
            tags: self.tags.into_iter().map(|t| t.name).collect(),
            on_sale: self.on_sale,
            created_at,
            average_rating: self.average_rating,
            updated_at: None,
        })
    }
}

/// WooCommerce sends site-local `YYYY-MM-DDTHH:MM:SS`; RFC 3339 is accepted too.
pub fn parse_upstream_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").ok()?;
    resolve_local_time(&Local, naive)
}

/// Wall-clock time in `tz` as a UTC instant. Ambiguous times take the earlier
/// instant; times skipped by a forward transition are read with the offset in
/// effect before it, landing just past the gap.
pub fn resolve_local_time<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }
    let before = tz
        .offset_from_local_datetime(&(naive - Duration::days(1)))
        .earliest()?
        .fix();
    before
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

// Prices and ratings arrive as decimal strings, "" meaning unset.
fn decimal<'de, D>(de: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Num(f64),
        Text(String),
        Null(()),
    }
    match Decimal::deserialize(de)? {
        Decimal::Num(n) => Ok(n),
        Decimal::Null(()) => Ok(0.0),
        Decimal::Text(s) if s.trim().is_empty() => Ok(0.0),
        Decimal::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid decimal '{}'", s))),
    }
}
