use super::{default_global_config_path, ConfigError, Settings};
use crate::shared::fs_atomic::atomic_write_file;
use std::fs;
use std::path::{Path, PathBuf};

pub fn save_global_settings(settings: &Settings) -> Result<PathBuf, ConfigError> {
    let path = default_global_config_path()?;
    save_settings_to(&path, settings)?;
    Ok(path)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    settings.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.display().to_string(),
            source,
        })?;
    }
    let body = serde_yaml::to_string(settings).map_err(|source| ConfigError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    atomic_write_file(path, body.as_bytes()).map_err(|source| ConfigError::Write {
        path: path.display().to_string(),
        source,
    })
}
