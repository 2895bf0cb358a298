use crate::config::CrabSnapConfig;
use std::sync::{Arc, RwLock};
use tauri::command;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<CrabSnapConfig>> = Arc::new(RwLock::new(CrabSnapConfig::load_or_default()));
}

/// Snapshot of the active configuration
pub fn current_config() -> CrabSnapConfig {
    match GLOBAL_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn store(new_config: &CrabSnapConfig) -> Result<(), String> {
    let mut config = GLOBAL_CONFIG
        .write()
        .map_err(|e| format!("Failed to write config: {}", e))?;
    *config = new_config.clone();
    Ok(())
}

/// Get the current configuration
#[command]
pub async fn get_config() -> Result<CrabSnapConfig, String> {
    Ok(current_config())
}

/// Update configuration, persist it and apply it to the live session
#[command]
pub async fn update_config(new_config: CrabSnapConfig) -> Result<(), String> {
    new_config.validate()?;
    store(&new_config)?;

    new_config
        .save_to_file(CrabSnapConfig::default_path())
        .map_err(|e| e.to_string())?;

    crate::commands::session::apply_config(new_config).await;
    Ok(())
}

/// Reset configuration to defaults
#[command]
pub async fn reset_config() -> Result<CrabSnapConfig, String> {
    let default_config = CrabSnapConfig::default();
    store(&default_config)?;

    default_config
        .save_to_file(CrabSnapConfig::default_path())
        .map_err(|e| e.to_string())?;

    crate::commands::session::apply_config(default_config.clone()).await;
    Ok(default_config)
}
