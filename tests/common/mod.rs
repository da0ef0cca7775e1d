//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_list_videos() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::authenticated_alice(server.base_url.clone()).await;
//!
//!     let response = client.list_videos("").await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::{data, envelope, TestClient};
pub use constants::*;
pub use server::TestServer;
