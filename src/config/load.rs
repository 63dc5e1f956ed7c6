use super::{default_global_config_path, ConfigError, Settings};
use std::path::Path;

pub fn load_global_settings() -> Result<Settings, ConfigError> {
    let path = default_global_config_path()?;
    load_settings_from(&path)
}

/// Reads settings from `path` (defaults when absent), applies env overrides and validates.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    let settings = Settings::from_path(path)?.with_env_overrides(|key| std::env::var(key).ok());
    settings.validate()?;
    Ok(settings)
}
