use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clipnest_server::config::{
    AppConfig, CliConfig, FileConfig, DEFAULT_ACCESS_TOKEN_TTL_SEC, DEFAULT_MAX_UPLOAD_MB,
    DEFAULT_REFRESH_TOKEN_TTL_SEC,
};
use clipnest_server::media::{LocalMediaStore, MediaStore};
use clipnest_server::server::metrics::init_metrics;
use clipnest_server::{run_server, FullStore, RequestsLoggingLevel, SqliteStore};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Directory holding the SQLite database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Directory for uploaded media. Defaults to `<db-dir>/media`.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Secret used to sign access and refresh tokens.
    #[clap(long, env = "CLIPNEST_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    #[clap(long, default_value_t = DEFAULT_ACCESS_TOKEN_TTL_SEC)]
    pub access_token_ttl_sec: u64,

    #[clap(long, default_value_t = DEFAULT_REFRESH_TOKEN_TTL_SEC)]
    pub refresh_token_ttl_sec: u64,

    /// Largest accepted upload, in megabytes.
    #[clap(long, default_value_t = DEFAULT_MAX_UPLOAD_MB)]
    pub max_upload_mb: usize,

    /// Mark auth cookies `Secure`.
    #[clap(long)]
    pub secure_cookies: bool,

    /// Optional TOML config file. Its values override the flags above.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            media_path: self.media_path.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            jwt_secret: self.jwt_secret.clone(),
            access_token_ttl_sec: self.access_token_ttl_sec,
            refresh_token_ttl_sec: self.refresh_token_ttl_sec,
            max_upload_mb: self.max_upload_mb,
            secure_cookies: self.secure_cookies,
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

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config file {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    let db_path = config.db_path();
    info!("Opening SQLite database at {:?}...", db_path);
    let store: Arc<dyn FullStore> = Arc::new(SqliteStore::new(&db_path)?);

    std::fs::create_dir_all(&config.media_path)
        .with_context(|| format!("Could not create media directory {:?}", config.media_path))?;
    info!("Storing media under {:?}", config.media_path);
    let media: Arc<dyn MediaStore> = Arc::new(LocalMediaStore::new(
        &config.media_path,
        config.max_upload_bytes,
    ));

    init_metrics();

    run_server(config.server_config(), store, media, config.token_issuer()).await
}
