use std::sync::Arc;

use axum::Router;
use common::posts::{ClientOptions, HttpPostSource};
use configs::{AppConfig, ServerConfig};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Bind `host:port`, resolving hostnames such as `localhost`
pub async fn bind(server: &ServerConfig) -> anyhow::Result<TcpListener> {
    let listener = TcpListener::bind((server.host.as_str(), server.port)).await?;
    Ok(listener)
}

/// Wire the upstream client and router from configuration
pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let opts = ClientOptions {
        timeout: cfg.upstream.timeout(),
        user_agent: cfg.upstream.user_agent.clone(),
    };
    let source = HttpPostSource::new(cfg.upstream.url.clone(), &opts)?;
    info!(upstream = %source.url(), timeout = ?opts.timeout, "upstream client ready");

    let state = AppState::new(Arc::new(source), cfg.page.heading.as_str());
    Ok(routes::build_router(state, build_cors()))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(event = "shutdown_signal", "received Ctrl+C, shutting down"),
        Err(e) => {
            // without a signal handler the server keeps running until killed
            error!(event = "signal_listen_failed", error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Public entry: build the app and serve until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg)?;

    let listener = bind(&cfg.server).await?;
    info!(addr = %listener.local_addr()?, "starting server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
