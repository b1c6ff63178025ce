use axum::{response::IntoResponse, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::observability;
use crate::page;
use crate::state::AppState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> impl IntoResponse {
    observability::encode_metrics()
}

/// Build the application router: the rendered page plus health and metrics
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    observability::init_metrics();

    Router::new()
        .route("/ssr", get(page::ssr_page))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx, including failed renders
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
