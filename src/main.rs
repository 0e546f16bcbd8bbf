use goal_ticker::{
    broadcast::UpdateBus,
    load_data,
    runtime::TickerRuntime,
    storage::load_completed,
    sync::SyncClient,
    ticker::TickerFrame,
    AppState, Config,
};
use std::net::SocketAddr;
use tokio::{fs, sync::watch};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env()?;
    for path in [&config.data_path, &config.completed_path, &config.goals_path] {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
    }

    let data = load_data(&config.data_path).await;
    let completed = load_completed(&config.completed_path).await;
    let bus = UpdateBus::default();
    let (frames_tx, frames_rx) = watch::channel(TickerFrame::default());

    let ticker = TickerRuntime {
        timing: config.timing,
        data_path: config.data_path.clone(),
        completed_path: config.completed_path.clone(),
    }
    .spawn(&bus, data.clone(), completed, frames_tx);

    if config.sync_url.is_none() {
        warn!("state sync disabled");
    }
    let state = AppState::new(
        config.data_path.clone(),
        config.goals_path.clone(),
        data,
        bus,
        SyncClient::new(config.sync_url.clone()),
        frames_rx,
    );
    let app = goal_ticker::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.shutdown().await;
    info!("shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
