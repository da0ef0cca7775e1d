//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database and media dir.

use super::constants::*;
use super::fixtures::seed_users;
use clipnest_server::identity::TokenIssuer;
use clipnest_server::media::{LocalMediaStore, MediaStore};
use clipnest_server::{make_app, FullStore, RequestsLoggingLevel, ServerConfig, SqliteStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use uuid::Uuid;

/// Test server instance with an isolated database.
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Store for direct database access in tests
    pub store: Arc<dyn FullStore>,

    pub alice_id: Uuid,
    pub bob_id: Uuid,

    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, seeded with alice and bob.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created, the port cannot be bound,
    /// or the server doesn't become ready within the timeout.
    pub async fn spawn() -> Self {
        Self::spawn_with_token_ttls(Duration::from_secs(300), Duration::from_secs(3600)).await
    }

    pub async fn spawn_with_token_ttls(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let sqlite_store =
            SqliteStore::new(temp_dir.path().join("clipnest.db")).expect("Failed to open store");
        let (alice_id, bob_id) = seed_users(&sqlite_store).expect("Failed to seed users");
        let store: Arc<dyn FullStore> = Arc::new(sqlite_store);

        let media_dir = temp_dir.path().join("media");
        let media: Arc<dyn MediaStore> =
            Arc::new(LocalMediaStore::new(&media_dir, TEST_MAX_UPLOAD_BYTES));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            media_dir,
            max_upload_bytes: TEST_MAX_UPLOAD_BYTES,
            secure_cookies: false,
        };
        let tokens = TokenIssuer::new("e2e-test-secret", access_ttl, refresh_ttl);
        let app = make_app(config, store.clone(), media, tokens);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            store,
            alice_id,
            bob_id,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Polls `GET /` until the server answers.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        while start.elapsed() < timeout {
            if let Ok(response) = client.get(format!("{}/", self.base_url)).send().await {
                if response.status().is_success() {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        panic!("Server did not become ready within {:?}", timeout);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
