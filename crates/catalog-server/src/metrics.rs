use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_histogram, register_histogram_vec, CounterVec,
    Gauge, Histogram, HistogramVec,
};

pub static OPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("catalog_ops_total", "Operations by result", &["op", "result"]).unwrap()
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("catalog_op_duration_seconds", "Operation durations", &["op"]).unwrap()
});

pub static SEGMENT_RULES: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "segment_rules_per_request",
        "Rules submitted per segment evaluation",
        vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0]
    )
    .unwrap()
});

pub static SEGMENT_REJECTIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "segment_rejections_total",
        "Rejected segment rules by reason",
        &["reason"]
    )
    .unwrap()
});

pub static INGEST_RUNS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "ingest_runs_total",
        "Ingestion runs by trigger and result",
        &["trigger", "result"]
    )
    .unwrap()
});

pub static INGEST_LAST_PRODUCTS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "ingest_last_products",
        "Products written by the last successful ingestion run"
    )
    .unwrap()
});

pub fn result_label<T, E>(res: &Result<T, E>) -> &'static str {
    if res.is_ok() {
        "ok"
    } else {
        "error"
    }
}
