//! HTTP surface of the mall portal: health endpoint and deployment tooling.

pub mod app;
pub mod config;
pub mod deploy;
pub mod probe;

pub use app::build_app;
pub use config::WebConfig;
