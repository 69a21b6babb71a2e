//! Show or initialize the configuration file.

use orangeface_common::config::config_file_path;
use orangeface_runtime::AppConfig;

pub fn run(config: &AppConfig, write_default: bool) -> anyhow::Result<()> {
    if write_default {
        let path = AppConfig::default().save()?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let path = config_file_path();
    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# {} (not found, using defaults)", path.display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);

    if let Err(e) = config.validate() {
        println!("Warning: {e}");
    }
    Ok(())
}
