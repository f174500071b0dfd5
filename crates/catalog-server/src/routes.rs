use crate::metrics;
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use catalog_core::{evaluate_request, CatalogError, Operator, Result};
use prometheus::{Encoder, TextEncoder};
use serde_json::{json, Value as JsonValue};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// A failed operation rendered as `{success: false, message, error}`.
pub struct ApiError {
    err: CatalogError,
    // message used when the cause is not the caller's fault
    context: &'static str,
}

impl ApiError {
    fn new(err: CatalogError, context: &'static str) -> Self {
        Self { err, context }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.err {
            e if e.is_validation() => StatusCode::BAD_REQUEST,
            CatalogError::ProductNotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let (message, error) = if status.is_client_error() {
            (self.err.to_string(), self.err.summary())
        } else {
            error!(error = %self.err, "{}", self.context);
            (self.context.to_string(), self.err.to_string())
        };
        (
            status,
            Json(json!({"success": false, "message": message, "error": error})),
        )
            .into_response()
    }
}

async fn bounded<T, F>(limit: Duration, op: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .unwrap_or_else(|_| Err(CatalogError::Timeout(op.to_string())))
}

pub async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"success": true, "message": "Server is working fine", "error": ""})),
    )
}

pub async fn list_products(State(app): State<AppState>) -> std::result::Result<Response, ApiError> {
    let _timer = metrics::OP_DURATION.with_label_values(&["list"]).start_timer();
    let res = bounded(app.storage_timeout, "product listing", app.store.all()).await;
    metrics::OPS_TOTAL
        .with_label_values(&["list", metrics::result_label(&res)])
        .inc();
    let products = res.map_err(|e| ApiError::new(e, "Failed to fetch products"))?;
    Ok(Json(json!({
        "success": true,
        "data": products,
        "message": "Products retrieved successfully",
        "error": null,
    }))
    .into_response())
}

pub async fn get_product(
    State(app): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> std::result::Result<Response, ApiError> {
    let Path(id) = id.map_err(|r| {
        ApiError::new(
            CatalogError::InvalidRequest(r.body_text()),
            "Failed to fetch product",
        )
    })?;
    let product = bounded(app.storage_timeout, "product lookup", app.store.get(id))
        .await
        .map_err(|e| ApiError::new(e, "Failed to fetch product"))?;
    Ok(Json(json!({
        "success": true,
        "data": product,
        "message": "Product retrieved successfully",
        "error": null,
    }))
    .into_response())
}

pub async fn ingest(State(app): State<AppState>) -> std::result::Result<Response, ApiError> {
    let Some(collector) = app.collector.as_ref() else {
        return Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "message": "Ingestion is not configured",
                "error": "WOOCOMMERCE_BASE_URL is not set",
            })),
        )
            .into_response());
    };
    let _timer = metrics::OP_DURATION.with_label_values(&["ingest"]).start_timer();
    let res = collector.run().await;
    metrics::INGEST_RUNS_TOTAL
        .with_label_values(&["manual", metrics::result_label(&res)])
        .inc();
    let products = res.map_err(|e| ApiError::new(e, "Failed to ingest products"))?;
    metrics::INGEST_LAST_PRODUCTS.set(products.len() as f64);
    Ok(Json(json!({
        "success": true,
        "message": format!("{} products ingested successfully", products.len()),
        "count": products.len(),
        "data": products,
        "error": null,
    }))
    .into_response())
}

fn compile(
    app: &AppState,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<catalog_core::CompiledPredicate> {
    let Json(body) = body.map_err(|r| CatalogError::InvalidRequest(r.body_text()))?;
    if let Some(rules) = body.get("rules").and_then(JsonValue::as_array) {
        metrics::SEGMENT_RULES.observe(rules.len() as f64);
    }
    evaluate_request(&body, app.registry).inspect_err(|e| {
        let reason = match e {
            CatalogError::InvalidRequest(_) => "invalid_request",
            CatalogError::MalformedRule { .. } => "malformed_rule",
            CatalogError::UnknownField { .. } => "unknown_field",
            CatalogError::UnknownOperator { .. } => "unknown_operator",
            _ => "invalid_value",
        };
        metrics::SEGMENT_REJECTIONS_TOTAL
            .with_label_values(&[reason])
            .inc();
        warn!(error = %e, "segment rejected");
    })
}

pub async fn evaluate_segment(
    State(app): State<AppState>,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let _timer = metrics::OP_DURATION.with_label_values(&["evaluate"]).start_timer();
    let predicate =
        compile(&app, body).map_err(|e| ApiError::new(e, "Failed to evaluate segment"))?;
    let res = bounded(app.storage_timeout, "segment query", app.store.find(&predicate)).await;
    metrics::OPS_TOTAL
        .with_label_values(&["evaluate", metrics::result_label(&res)])
        .inc();
    let products = res.map_err(|e| ApiError::new(e, "Failed to evaluate segment"))?;
    info!(
        constraints = predicate.len(),
        matched = products.len(),
        "segment evaluated"
    );
    Ok(Json(json!({
        "data": products,
        "message": "Products retrieved successfully",
        "error": null,
    }))
    .into_response())
}

pub async fn explain_segment(
    State(app): State<AppState>,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let predicate =
        compile(&app, body).map_err(|e| ApiError::new(e, "Failed to compile segment"))?;
    Ok(Json(json!({
        "success": true,
        "data": predicate,
        "message": "Rules compiled successfully",
        "error": null,
    }))
    .into_response())
}

pub async fn segment_fields(State(app): State<AppState>) -> impl IntoResponse {
    let operators: Vec<&str> = Operator::ALL.iter().map(Operator::symbol).collect();
    Json(json!({
        "success": true,
        "data": {"fields": app.registry, "operators": operators},
        "message": "Segment fields retrieved successfully",
        "error": null,
    }))
}

pub async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    (StatusCode::OK, String::from_utf8(buf).unwrap_or_default())
}

pub async fn admin_snapshot(State(app): State<AppState>) -> std::result::Result<Response, ApiError> {
    let (snapshot_id, products) = app
        .store
        .admin_snapshot()
        .await
        .map_err(|e| ApiError::new(e, "Failed to snapshot store"))?;
    Ok(Json(json!({"snapshot_id": snapshot_id, "products": products})).into_response())
}

pub async fn admin_manifest(State(app): State<AppState>) -> std::result::Result<Response, ApiError> {
    let m = app
        .store
        .admin_manifest()
        .await
        .map_err(|e| ApiError::new(e, "Failed to read manifest"))?;
    Ok(Json(m).into_response())
}
