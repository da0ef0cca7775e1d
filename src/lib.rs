//! Clipnest server library
//!
//! A video-sharing backend: accounts, videos, comments, tweets, playlists,
//! likes and subscriptions over a versioned SQLite store, served by axum.

pub mod config;
pub mod content;
pub mod error;
pub mod identity;
pub mod media;
pub mod server;
pub mod social;
pub mod sqlite_persistence;
pub mod store;
pub mod views;

pub use error::{ApiError, ApiResult};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use store::{FullStore, SqliteStore};
