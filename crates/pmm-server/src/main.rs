use pmm_server::config::ServerConfig;

const DEFAULT_CONFIG_PATH: &str = "pmms.json";

#[tokio::main]
async fn main() {
    let config_path = resolve_config_path();
    let config = ServerConfig::load(&config_path);
    let _log_guard = pmm_server::logging::init(&config.log);

    config.validate();

    let (listener, state) = pmm_server::build_server(config).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to bind listening socket");
        std::process::exit(1);
    });

    tracing::info!(addr = %listener.local_addr().unwrap(), "pmm-server listening");

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received, draining acceptor pool");
            shutdown.cancel();
        }
    });

    pmm_server::run(listener, state).await;
    tracing::info!("pmm-server shut down cleanly");
}

/// `--config <path>` takes priority over `PMMS_CONFIG_PATH`, which takes
/// priority over the built-in default — the teacher has no CLI parser for
/// its single optional argument, so this is a plain `std::env::args()` scan
/// rather than reaching for a new dependency class.
fn resolve_config_path() -> String {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config"
            && let Some(path) = args.next()
        {
            return path;
        }
    }
    std::env::var("PMMS_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}
