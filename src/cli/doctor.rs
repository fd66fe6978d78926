//! CLI `doctor` command: report which settings are present.

use anyhow::Result;

use crate::config::{default_config_path, LookbookConfig, SettingState};

pub fn doctor(config: &LookbookConfig) -> Result<()> {
    let config_path = default_config_path();

    println!("Lookbook Configuration Report");
    println!("=============================");
    println!();
    if config_path.exists() {
        println!("Config file:       {}", config_path.display());
    } else {
        println!("Config file:       not found at {} (env only)", config_path.display());
    }
    println!("Image directory:   {}", config.image_dir().display());
    println!("Record file:       {}", config.records_path().display());
    println!("Index dimensions:  {}", config.embedding.dimensions);
    println!();

    println!("Settings:");
    for (var, value) in config.required_settings() {
        let state = match config.setting_state(var, value) {
            SettingState::Set => "set",
            SettingState::Covered => "in connection string",
            SettingState::Missing => "MISSING",
        };
        println!("  {var:<32} {state}");
    }

    let missing = config.missing_settings();
    println!();
    if missing.is_empty() {
        println!("Status:            OK");
    } else {
        println!("Status:            {} setting(s) missing", missing.len());
        println!("Set them in .env, the environment, or {}", config_path.display());
    }
    Ok(())
}
