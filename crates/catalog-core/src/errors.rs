use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Malformed rule '{rule}': expected 'field operator value', got {tokens} token(s)")]
    MalformedRule { rule: String, tokens: usize },
    #[error("Invalid field '{field}' in rule '{rule}'")]
    UnknownField { field: String, rule: String },
    #[error("Invalid operator '{operator}' in rule '{rule}'")]
    UnknownOperator { operator: String, rule: String },
    #[error("Invalid number value '{value}' for field '{field}'")]
    InvalidNumber { value: String, field: String },
    #[error("Invalid date value '{value}' for field '{field}'")]
    InvalidDate { value: String, field: String },
    #[error("Invalid boolean value '{value}' for field '{field}'")]
    InvalidBoolean { value: String, field: String },
    #[error("Unsupported field type '{type_name}' for field '{field}'")]
    UnsupportedFieldType { field: String, type_name: String },
    #[error("upstream fetch failed: {0}")]
    UpstreamFetchFailure(String),
    #[error("storage failure: {0}")]
    StorageFailure(String),
    #[error("{0} timed out")]
    Timeout(String),
    #[error("product {0} not found")]
    ProductNotFound(i64),
}

impl CatalogError {
    /// Rejections caused by the request itself; never retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidRequest(_)
                | CatalogError::MalformedRule { .. }
                | CatalogError::UnknownField { .. }
                | CatalogError::UnknownOperator { .. }
                | CatalogError::InvalidNumber { .. }
                | CatalogError::InvalidDate { .. }
                | CatalogError::InvalidBoolean { .. }
                | CatalogError::UnsupportedFieldType { .. }
        )
    }

    /// Short label used as the `error` field of API responses.
    pub fn summary(&self) -> String {
        match self {
            CatalogError::InvalidRequest(msg) => msg.clone(),
            CatalogError::MalformedRule { .. } => "Malformed rule".into(),
            CatalogError::UnknownField { field, .. } => format!("Invalid field '{}'", field),
            CatalogError::UnknownOperator { operator, .. } => {
                format!("Invalid operator '{}'", operator)
            }
            CatalogError::InvalidNumber { .. } => "Invalid number".into(),
            CatalogError::InvalidDate { .. } => "Invalid date".into(),
            CatalogError::InvalidBoolean { .. } => "Invalid boolean".into(),
            CatalogError::UnsupportedFieldType { .. } => "Field type not supported".into(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
