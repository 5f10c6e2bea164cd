use std::path::Path;

use anyhow::{Context, Result};
use eloqua::{SchemaResolver, discover};

/// Execute the `discover` command: print the catalog as JSON.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let client = super::connect(&config)?;

    let resolver = SchemaResolver::new(&client);
    let catalog = discover(&resolver, &config.selected_streams()?)?;

    let json = serde_json::to_string_pretty(&catalog).context("Failed to serialize catalog")?;
    println!("{}", json);
    Ok(())
}
