//! uplinkd: the uplink daemon.
//!
//! Opens the reading store once, hands it to the HTTP API and serves the
//! TTN webhook plus the read endpoints until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! uplinkd serve --config uplink.toml --port 3000 --data-dir /var/lib/uplink
//! uplinkd config init > uplink.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use uplink_core::{UplinkConfig, WriteMode};
use uplink_store::{ReadingStore, SeriesStore};

#[derive(Parser)]
#[command(name = "uplinkd", about = "LoRaWAN uplink webhook sink")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the webhook and read API.
    Serve {
        /// Path to uplink.toml. Defaults apply when omitted.
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides `server.port`).
        #[arg(long, env = "PORT")]
        port: Option<u16>,

        /// Address to bind (overrides `server.bind`).
        #[arg(long)]
        bind: Option<String>,

        /// Directory for the reading database (overrides `store.data_dir`).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// `atomic` or `sequential` (overrides `store.write_mode`).
        #[arg(long)]
        write_mode: Option<WriteMode>,
    },

    /// Configuration helpers.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print a default uplink.toml to stdout.
    Init,
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,uplinkd=debug,uplink=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve {
            config,
            port,
            bind,
            data_dir,
            write_mode,
        } => {
            let mut config = match config {
                Some(path) => UplinkConfig::from_file(&path)
                    .with_context(|| format!("failed to load config from {}", path.display()))?,
                None => UplinkConfig::default(),
            };
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(data_dir) = data_dir {
                config.store.data_dir = data_dir;
            }
            if let Some(mode) = write_mode {
                config.store.write_mode = mode;
            }
            run_serve(config).await
        }
        Command::Config(ConfigCommand::Init) => {
            print!("{}", UplinkConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

async fn run_serve(config: UplinkConfig) -> anyhow::Result<()> {
    info!("uplink daemon starting");
    debug!(?config, "effective configuration");

    std::fs::create_dir_all(&config.store.data_dir).with_context(|| {
        format!("failed to create data dir {}", config.store.data_dir.display())
    })?;
    let db_path = config.store.database_path();

    let store: Arc<dyn SeriesStore> = Arc::new(ReadingStore::open(&db_path)?);
    info!(path = ?db_path, write_mode = %config.store.write_mode, "reading store opened");

    let router = uplink_api::build_router(store, &config);
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook endpoint: POST http://{addr}/ttn");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("uplink daemon stopped");
    Ok(())
}
