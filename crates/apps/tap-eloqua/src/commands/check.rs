use std::path::Path;

use anyhow::{Result, bail};
use eloqua::{BulkApi, BulkEntity};

/// Execute the `check` command: validate config, credentials and field access.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    println!("Config:            OK");

    let client = super::connect(&config)?;
    println!("Credentials:       OK ({})", client.base_url());

    let mut failed = false;
    for entity in [BulkEntity::Contacts, BulkEntity::Activities] {
        let label = format!("{} fields:", entity.path());
        match client.list_fields(entity, 0, 1) {
            Ok(page) => println!("{:18} OK ({} available)", label, page.total_results),
            Err(e) => {
                println!("{:18} FAILED", label);
                println!("  {:#}", e);
                failed = true;
            }
        }
    }

    if failed {
        bail!("One or more checks failed")
    }
    println!("\nAll checks passed.");
    Ok(())
}
