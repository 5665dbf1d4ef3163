//! Prometheus exporter for the Space Engineers dedicated server remote API.

#[macro_use]
extern crate tracing;

pub mod error;
pub mod exposition;
pub mod logging;
pub mod server;

use color_eyre::Result;
use eyre::Context as _;
use se_exporter_client::{
    CollectMode,
    CollectorOptions,
    Credentials,
    MetricsCollector,
};
pub use se_exporter_config::{
    Args,
    Config,
};

pub fn init_errors() -> Result<()> {
    color_eyre::install()
}

pub fn init_logging(config: &Config) -> Result<()> {
    logging::log_init(config.log_level()?)
}

/// Validates the remote API settings and builds the collector used by every scrape.
pub fn collector_from_config(config: &Config) -> Result<MetricsCollector> {
    let credentials = Credentials::new(
        config.host.as_deref().unwrap_or_default(),
        Some(config.port),
        config.token.as_deref(),
    )
    .context("Invalid remote API settings")?;

    let options = CollectorOptions {
        mode: CollectMode::from_run_async(config.run_async),
        resources: config.resources.clone(),
        identity_fields: config.identity_fields.clone(),
        excluded_fields: config.excluded_fields.clone(),
    };

    info!(origin = credentials.origin(), mode = ?options.mode, "remote API configured");
    Ok(MetricsCollector::new(credentials, options)?)
}
