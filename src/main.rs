use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use music_catalog_server::catalog_store::SqliteCatalogStore;
use music_catalog_server::config;
use music_catalog_server::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite catalog database file, created if missing.
    /// Can also be specified in config file.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Number of read-only connections to the catalog database.
    #[clap(long, default_value_t = 4)]
    pub read_pool_size: usize,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            db_path: args.db_path.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            read_pool_size: args.read_pool_size,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  db_path: {:?}", app_config.db_path);
    info!("  port: {}", app_config.port);
    info!("  metrics_port: {}", app_config.metrics_port);
    info!("  logging_level: {}", app_config.logging_level);

    if !app_config.db_path.exists() {
        info!("Creating new catalog database at {:?}", app_config.db_path);
    }
    let catalog_store = Arc::new(SqliteCatalogStore::new(
        &app_config.db_path,
        app_config.read_pool_size,
    )?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::set_catalog_counts(&catalog_store.counts()?);

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level,
        port: app_config.port,
        metrics_port: app_config.metrics_port,
    };

    info!(
        "Ready to serve at port {} (metrics at port {})!",
        server_config.port, server_config.metrics_port
    );
    run_server(catalog_store, server_config).await
}
