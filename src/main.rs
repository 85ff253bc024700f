use std::sync::Arc;

use anyhow::Result;
use estate_site::{config, context::AppContext, logger::setup_logger, web};
use log::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    setup_logger()?;

    let config = Arc::new(config::read_config());

    let context = AppContext::from_config(config).await;
    context.initialize().await;

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Could not listen for shutdown signal: {:?}", err);
        }
        info!("Shutdown requested");
        let _ = shutdown_tx.send(());
    });

    let server_result = web::start_http_server(context.clone(), shutdown_rx).await;

    // Persist edits still waiting out their debounce window.
    context.content.flush().await;

    if let Err(err) = &server_result {
        error!("Error: {:?}", err);
    }
    server_result
}
