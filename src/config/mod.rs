mod file_config;

pub use file_config::{AuthConfig, FileConfig};

use crate::identity::TokenIssuer;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use rand::{distr::Alphanumeric, Rng};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_ACCESS_TOKEN_TTL_SEC: u64 = 15 * 60;
pub const DEFAULT_REFRESH_TOKEN_TTL_SEC: u64 = 10 * 24 * 60 * 60;
pub const DEFAULT_MAX_UPLOAD_MB: usize = 512;

const GENERATED_SECRET_LEN: usize = 48;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_dir: Option<PathBuf>,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub jwt_secret: Option<String>,
    pub access_token_ttl_sec: u64,
    pub refresh_token_ttl_sec: u64,
    pub max_upload_mb: usize,
    pub secure_cookies: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            db_dir: None,
            media_path: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            jwt_secret: None,
            access_token_ttl_sec: DEFAULT_ACCESS_TOKEN_TTL_SEC,
            refresh_token_ttl_sec: DEFAULT_REFRESH_TOKEN_TTL_SEC,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            secure_cookies: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub max_upload_bytes: usize,
    pub secure_cookies: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();
        let auth = file.auth.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or_else(|| cli.db_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_dir must be specified via --db-dir or in config file")
            })?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| db_dir.join("media"));

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);
        if port == metrics_port {
            bail!("port and metrics_port must differ, both are {}", port);
        }

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Unknown logging_level in config file: {:?}", s),
            },
            None => cli.logging_level.clone(),
        };

        let jwt_secret = match auth.jwt_secret.or_else(|| cli.jwt_secret.clone()) {
            Some(secret) if secret.trim().is_empty() => bail!("jwt_secret must not be blank"),
            Some(secret) => secret,
            None => {
                warn!("No JWT secret configured, generating a random one. Tokens will not survive a restart.");
                generate_secret()
            }
        };

        let access_token_ttl_sec = auth
            .access_token_ttl_sec
            .unwrap_or(cli.access_token_ttl_sec);
        let refresh_token_ttl_sec = auth
            .refresh_token_ttl_sec
            .unwrap_or(cli.refresh_token_ttl_sec);
        if access_token_ttl_sec == 0 || refresh_token_ttl_sec == 0 {
            bail!("Token lifetimes must be positive");
        }

        let max_upload_mb = file.max_upload_mb.unwrap_or(cli.max_upload_mb);
        if max_upload_mb == 0 {
            bail!("max_upload_mb must be positive");
        }

        let secure_cookies = file.secure_cookies.unwrap_or(cli.secure_cookies);

        Ok(Self {
            db_dir,
            media_path,
            port,
            metrics_port,
            logging_level,
            jwt_secret,
            access_token_ttl: Duration::from_secs(access_token_ttl_sec),
            refresh_token_ttl: Duration::from_secs(refresh_token_ttl_sec),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            secure_cookies,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.db_dir.join("clipnest.db")
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            media_dir: self.media_path.clone(),
            max_upload_bytes: self.max_upload_bytes,
            secure_cookies: self.secure_cookies,
        }
    }

    pub fn token_issuer(&self) -> TokenIssuer {
        TokenIssuer::new(
            &self.jwt_secret,
            self.access_token_ttl,
            self.refresh_token_ttl,
        )
    }
}

fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_temp_db_dir() -> TempDir {
        TempDir::new().unwrap()
    }

    fn cli_with_dir(dir: &TempDir) -> CliConfig {
        CliConfig {
            db_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("body"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(matches!(
            parse_logging_level("PATH"),
            Some(RequestsLoggingLevel::Path)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(temp_dir.path().to_path_buf()),
            media_path: Some(PathBuf::from("/media")),
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Headers,
            jwt_secret: Some("cli-secret".to_string()),
            access_token_ttl_sec: 60,
            refresh_token_ttl_sec: 3600,
            max_upload_mb: 2,
            secure_cookies: true,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.media_path, PathBuf::from("/media"));
        assert_eq!(config.port, 3001);
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.jwt_secret, "cli-secret");
        assert_eq!(config.access_token_ttl, Duration::from_secs(60));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
        assert!(config.secure_cookies);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/should/be/overridden")),
            media_path: Some(PathBuf::from("/cli/media")),
            jwt_secret: Some("cli-secret".to_string()),
            ..Default::default()
        };

        let file_config = FileConfig {
            db_dir: Some(temp_dir.path().to_string_lossy().to_string()),
            media_path: Some("/toml/media".to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            auth: Some(AuthConfig {
                jwt_secret: Some("toml-secret".to_string()),
                access_token_ttl_sec: Some(120),
                refresh_token_ttl_sec: None,
            }),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.db_dir, temp_dir.path());
        assert_eq!(config.media_path, PathBuf::from("/toml/media"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        assert_eq!(config.jwt_secret, "toml-secret");
        assert_eq!(config.access_token_ttl, Duration::from_secs(120));
        // CLI value used when TOML doesn't specify
        assert_eq!(config.metrics_port, 9091);
        assert_eq!(
            config.refresh_token_ttl,
            Duration::from_secs(DEFAULT_REFRESH_TOKEN_TTL_SEC)
        );
    }

    #[test]
    fn test_resolve_missing_db_dir_error() {
        let cli = CliConfig::default();
        let result = AppConfig::resolve(&cli, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("db_dir must be specified"));
    }

    #[test]
    fn test_resolve_nonexistent_db_dir_error() {
        let cli = CliConfig {
            db_dir: Some(PathBuf::from("/nonexistent/path/that/should/not/exist")),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_resolve_db_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            db_dir: Some(temp_file.path().to_path_buf()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_missing_secret_is_generated() {
        let temp_dir = make_temp_db_dir();
        let first = AppConfig::resolve(&cli_with_dir(&temp_dir), None).unwrap();
        let second = AppConfig::resolve(&cli_with_dir(&temp_dir), None).unwrap();

        assert_eq!(first.jwt_secret.len(), GENERATED_SECRET_LEN);
        assert_ne!(first.jwt_secret, second.jwt_secret);
    }

    #[test]
    fn test_blank_secret_is_rejected() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            jwt_secret: Some("   ".to_string()),
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_unknown_toml_logging_level_is_rejected() {
        let temp_dir = make_temp_db_dir();
        let file_config = FileConfig {
            logging_level: Some("verbose".to_string()),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli_with_dir(&temp_dir), Some(file_config));
        assert!(result.unwrap_err().to_string().contains("logging_level"));
    }

    #[test]
    fn test_zero_ttl_and_same_ports_are_rejected() {
        let temp_dir = make_temp_db_dir();
        let cli = CliConfig {
            access_token_ttl_sec: 0,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());

        let cli = CliConfig {
            port: 8080,
            metrics_port: 8080,
            ..cli_with_dir(&temp_dir)
        };
        assert!(AppConfig::resolve(&cli, None).is_err());
    }

    #[test]
    fn test_derived_paths_and_server_config() {
        let temp_dir = make_temp_db_dir();
        let config = AppConfig::resolve(&cli_with_dir(&temp_dir), None).unwrap();

        assert_eq!(config.db_path(), temp_dir.path().join("clipnest.db"));
        assert_eq!(config.media_path, temp_dir.path().join("media"));

        let server_config = config.server_config();
        assert_eq!(server_config.media_dir, temp_dir.path().join("media"));
        assert_eq!(server_config.port, 3001);
        assert_eq!(
            server_config.max_upload_bytes,
            DEFAULT_MAX_UPLOAD_MB * 1024 * 1024
        );
    }
}
