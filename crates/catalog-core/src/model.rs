use crate::predicate::TypedValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ProductId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub regular_price: f64,
    pub sale_price: f64,
    pub stock_status: String,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub on_sale: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub average_rating: f64,
    // stamped by the store on every upsert
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Typed view of a filterable attribute. `None` when the attribute is
    /// unset on this product or is not a scalar the rule grammar can address.
    pub fn field_value(&self, field: &str) -> Option<TypedValue> {
        match field {
            "price" => Some(TypedValue::Number(self.price)),
            "regular_price" => Some(TypedValue::Number(self.regular_price)),
            "sale_price" => Some(TypedValue::Number(self.sale_price)),
            "average_rating" => Some(TypedValue::Number(self.average_rating)),
            "stock_quantity" => self.stock_quantity.map(|q| TypedValue::Number(q as f64)),
            "title" => Some(TypedValue::String(self.title.clone())),
            "stock_status" => Some(TypedValue::String(self.stock_status.clone())),
            "category" => self.category.clone().map(TypedValue::String),
            "created_at" => Some(TypedValue::Date(self.created_at)),
            "on_sale" => Some(TypedValue::Boolean(self.on_sale)),
            _ => None,
        }
    }
}
