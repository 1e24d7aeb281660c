use std::{net::SocketAddr, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};
use visitor_counter::{AppState, Config, EventLog, FileSheet, router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env().inspect_err(|err| error!("invalid configuration: {err}"))?;

    let sheet = FileSheet::open(&config.sheet_path).inspect_err(|err| error!("{err}"))?;
    info!(path = %sheet.path().display(), "opened sheet");

    let log = EventLog::new(Arc::new(sheet), config.utc_offset, config.cache_ttl);
    log.ensure_schema(&config.schema)
        .await
        .inspect_err(|err| error!("failed to prepare sheet header: {err}"))?;

    let state = AppState::new(log, config.password, config.initial_visitors);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for ctrl-c: {err}");
        return;
    }
    info!("shutting down");
}
