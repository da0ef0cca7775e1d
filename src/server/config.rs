use std::path::PathBuf;

use super::RequestsLoggingLevel;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Directory served at `/media`.
    pub media_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Marks auth cookies `Secure`, for deployments behind TLS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            metrics_port: 9091,
            media_dir: PathBuf::from("media"),
            max_upload_bytes: 512 * 1024 * 1024,
            secure_cookies: false,
        }
    }
}
