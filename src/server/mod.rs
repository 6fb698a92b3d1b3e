pub mod config;
mod errors;
mod http_layers;
pub mod metrics;
pub mod server;
pub mod state;
pub mod views;

pub use config::ServerConfig;
pub use errors::ApiError;
pub use http_layers::*;
pub use server::{make_app, make_metrics_app, run_server};
