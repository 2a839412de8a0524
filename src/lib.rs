use std::time::Duration;

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod cover;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod readme;
pub mod render;
pub mod store;

pub use config::{Config, Credentials};
pub use error::{Error, Result};
pub use logging::Diagnostics;
pub use pipeline::{Pipeline, RunReport};
pub use render::RenderMode;

pub static USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by every stage of a run. `timeout` bounds each request.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}
