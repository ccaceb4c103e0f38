use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

use sleepnumberd::Config;
use sleepnumberd::Engine;
use sleepnumberd::api;

#[derive(Parser)]
#[command(name = "sleepnumberd", about = "Bridge SleepNumber beds into presence sensors")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sleepnumberd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)?;

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(config.logging.level))
        .init();

    tracing::info!("sleepnumberd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let mut engine = Engine::new();
    engine.register_integrations_from_config(&config)?;
    let engine = Arc::new(engine);

    let (api_shutdown_tx, api_shutdown_rx) = tokio::sync::oneshot::channel();
    let mut api_handle = None;
    if config.api.enabled {
        let api_engine = Arc::clone(&engine);
        let listen = config.api.listen.clone();
        let port = config.api.port;
        api_handle = Some(tokio::spawn(async move {
            if let Err(e) = api::serve(listen, port, api_engine, api_shutdown_rx).await {
                tracing::error!("HTTP API server error: {}", e);
            }
        }));
    }

    tokio::select! {
        res = engine.run() => {
            if let Err(e) = res {
                tracing::error!("Engine error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
    }

    let _ = api_shutdown_tx.send(());
    if let Some(handle) = api_handle {
        let _ = handle.await;
    }

    tracing::info!("sleepnumberd shutdown complete");

    Ok(())
}
