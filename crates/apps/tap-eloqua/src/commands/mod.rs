pub mod check;
pub mod discover;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};
use eloqua::{BasicAuth, EloquaClient, TapConfig};
use log::info;

/// Load and validate the tap config
pub fn load_config(path: Option<&Path>) -> Result<TapConfig> {
    TapConfig::load(path).context("Failed to load tap config")
}

/// Authenticate and resolve the account's pod
pub fn connect(config: &TapConfig) -> Result<EloquaClient> {
    let auth = BasicAuth::new(&config.sitename, &config.username, &config.password);
    let client = EloquaClient::connect(auth, &config.export)
        .with_context(|| format!("Failed to connect to Eloqua site '{}'", config.sitename))?;
    info!("Connected to {}", client.base_url());
    Ok(client)
}
