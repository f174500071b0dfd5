use crate::errors::{CatalogError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Number,
    String,
    Date,
    Boolean,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "number" => Ok(FieldType::Number),
            "string" => Ok(FieldType::String),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            _ => Err(()),
        }
    }
}

/// Filterable field name -> declared value type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldRegistry(BTreeMap<String, FieldType>);

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.0.insert(name.into(), ty);
        self
    }

    /// Build from declarative `(field, type-name)` pairs such as a config table.
    pub fn from_declarations<'a, I>(decls: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut fields = BTreeMap::new();
        for (name, type_name) in decls {
            let ty = type_name
                .parse::<FieldType>()
                .map_err(|_| CatalogError::UnsupportedFieldType {
                    field: name.to_string(),
                    type_name: type_name.to_string(),
                })?;
            fields.insert(name.to_string(), ty);
        }
        Ok(Self(fields))
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

const PRODUCT_FIELD_DECLS: &[(&str, FieldType)] = &[
    ("price", FieldType::Number),
    ("regular_price", FieldType::Number),
    ("sale_price", FieldType::Number),
    ("stock_quantity", FieldType::Number),
    ("average_rating", FieldType::Number),
    ("title", FieldType::String),
    ("category", FieldType::String),
    ("stock_status", FieldType::String),
    ("created_at", FieldType::Date),
    ("on_sale", FieldType::Boolean),
];

/// The registry segment rules are validated against.
pub static PRODUCT_FIELDS: Lazy<FieldRegistry> = Lazy::new(|| {
    PRODUCT_FIELD_DECLS
        .iter()
        .fold(FieldRegistry::new(), |reg, (name, ty)| reg.with_field(*name, *ty))
});
