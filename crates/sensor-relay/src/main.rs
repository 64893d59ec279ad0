//! sensor-relay binary: load config, bind, serve.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sensor_config::{LoadedConfig, LogLevel, RelayServerConfig};
use sensor_history::HistoryService;
use sensor_relay::{serve, AppState, Hub};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "sensor-relay",
    about = "Real-time sensor relay with an InfluxDB history API"
)]
struct Args {
    /// Path to a TOML config file (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding config and environment.
    #[arg(short, long)]
    port: Option<u16>,

    /// Write a documented default config file and exit.
    #[arg(long)]
    init_config: bool,
}

fn main() {
    let args = Args::parse();

    if args.init_config {
        init_tracing(LogLevel::default());
        std::process::exit(match init_config(args.config) {
            Ok(path) => {
                println!("wrote {}", path.display());
                0
            }
            Err(e) => {
                eprintln!("sensor-relay: {e}");
                1
            }
        });
    }

    // Config (and `.env`) load before the runtime exists, while the process
    // is still single-threaded.
    let LoadedConfig {
        mut config,
        source,
        dotenv,
    } = match sensor_config::load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("sensor-relay: {e}");
            std::process::exit(1);
        }
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(config.logging.level);
    tracing::info!(source = %source, "Loaded config");
    if let Some(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded .env");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start tokio runtime");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(config)) {
        tracing::error!(error = %e, "sensor-relay stopped");
        std::process::exit(1);
    }
}

fn init_tracing(level: LogLevel) {
    let level = level.as_str();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "sensor_relay={level},sensor_history={level},sensor_config={level},tower_http=warn"
                )
                .into()
            }),
        )
        .init();
}

fn init_config(path: Option<PathBuf>) -> sensor_common::Result<PathBuf> {
    let path = match path {
        Some(path) => path,
        None => sensor_config::default_config_path()?,
    };
    sensor_config::create_default_config(&path)?;
    Ok(path)
}

async fn run(config: RelayServerConfig) -> sensor_common::Result<()> {
    tracing::debug!(
        config = %sensor_config::config_to_json(&config),
        "Effective configuration"
    );

    let history = HistoryService::from_config(&config.influxdb)?;
    let hub = Hub::from_config(&config.relay);

    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server running on {}", addr);
    match config.relay.connection_limit() {
        Some(limit) => tracing::info!(limit, "Relay connection limit"),
        None => tracing::info!("Relay connection limit: unlimited"),
    }

    // Periodic hub size log.
    let stats_hub = hub.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let count = stats_hub.count().await;
            tracing::debug!(connections = count, "Hub tick");
        }
    });

    let state = AppState::new(hub, history, &config);
    serve(listener, state, shutdown_signal()).await?;

    tracing::info!("sensor-relay shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
