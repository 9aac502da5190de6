//! Print default parameters.

use evm_common::config::AppConfig;
use evm_core::{EvmConfig, ModeKind};

pub fn run(mode: ModeKind, init: bool) -> anyhow::Result<()> {
    let config = EvmConfig::default_for(mode);
    println!("{}", serde_json::to_string_pretty(&config)?);

    if init {
        let path = AppConfig::path();
        if path.exists() {
            println!("App config already exists: {}", path.display());
        } else {
            AppConfig::default().save()?;
            println!("Wrote app config: {}", path.display());
        }
    }
    Ok(())
}
