use std::process::ExitCode;

use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // .env first so RUST_LOG and LOG_FORMAT take effect
    dotenv().ok();
    common::utils::logging::init_logging_from_env();
}

fn install_panic_hook(service_id: Uuid) {
    std::panic::set_hook(Box::new(move |info| {
        error!(service = "ssr-page", event = "panic", %service_id, message = %info, "unhandled panic occurred");
    }));
}

fn build_runtime(worker_threads: Option<usize>) -> std::io::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    builder.build()
}

fn main() -> ExitCode {
    init_logging();
    let service_id = Uuid::new_v4();
    install_panic_hook(service_id);

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(service = "ssr-page", event = "config_invalid", error = %format!("{e:#}"), "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let rt = match build_runtime(cfg.server.worker_threads) {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "ssr-page", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "ssr-page",
        event = "start",
        %service_id,
        pid = std::process::id(),
        version = env!("CARGO_PKG_VERSION"),
        threads = cfg.server.worker_threads.unwrap_or_default(),
        upstream = %cfg.upstream.url,
        "ssr page service starting"
    );

    match rt.block_on(server::run(cfg)) {
        Ok(()) => {
            info!(service = "ssr-page", event = "stop", %service_id, "server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "ssr-page", event = "run_failed", %service_id, error = %format!("{e:#}"), "server exited with error");
            ExitCode::FAILURE
        }
    }
}
