use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder};

// Prometheus metrics (default registry)
pub static PAGE_RENDERS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ssr_page_renders_total",
        "Total page render requests"
    )
    .expect("register page_renders_total")
});

pub static PAGE_RENDER_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ssr_page_render_failures_total",
        "Total page renders that failed on the upstream fetch"
    )
    .expect("register page_render_failures_total")
});

pub static UPSTREAM_FETCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ssr_upstream_fetches_total",
        "Total outbound post fetches"
    )
    .expect("register upstream_fetches_total")
});

pub static UPSTREAM_FETCH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ssr_upstream_fetch_duration_seconds",
        "Upstream fetch duration in seconds",
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register upstream_fetch_duration")
});

pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}

/// Register every metric so `/metrics` lists them before the first render.
pub fn init_metrics() {
    Lazy::force(&PAGE_RENDERS_TOTAL);
    Lazy::force(&PAGE_RENDER_FAILURES_TOTAL);
    Lazy::force(&UPSTREAM_FETCHES_TOTAL);
    Lazy::force(&UPSTREAM_FETCH_DURATION);
}
