mod app;

use anyhow::Result;
use std::fs::{self, OpenOptions};

use flock_core::{
    config::{self, AppConfig},
    launch,
    sync::SyncController,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let launch_param = launch::from_env();
    let player = launch::player_index(launch_param.as_deref());

    let (mut controller, transport_rx) = SyncController::connect(&config, player);
    controller.on_snapshot(|model| {
        tracing::debug!(
            boards = model.boards.len(),
            discard = model.discard.len(),
            "Board refreshed"
        );
    });

    let mut app = app::FlockApp::new(controller, config.board.set_ordering);
    app.attach_transport(transport_rx);
    let result = app.run().await;
    if let Err(err) = app.shutdown().await {
        tracing::error!("Disconnect failed: {err}");
    }
    result
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("flock.log");

    let env_filter = EnvFilter::from_default_env();

    // The terminal UI owns stdout, so logs only go to the file.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
