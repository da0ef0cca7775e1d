mod auth_routes;
mod channel_routes;
mod comment_routes;
pub mod config;
pub mod envelope;
mod http_layers;
pub mod metrics;
mod playlist_routes;
pub mod server;
pub mod session;
pub mod state;
mod tweet_routes;
mod upload_form;
mod user_routes;
mod video_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
