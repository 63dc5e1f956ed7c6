use crate::chat::ChatServices;
use crate::config::{default_state_root_path, load_global_settings, ConfigError, Settings};
use crate::shared::ids::ChatId;
use std::fs;
use std::path::PathBuf;

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn ensure_state_root() -> Result<PathBuf, String> {
    let root = default_state_root_path().map_err(map_config_err)?;
    fs::create_dir_all(&root).map_err(|e| format!("failed to create {}: {e}", root.display()))?;
    Ok(root)
}

pub fn load_settings() -> Result<Settings, String> {
    load_global_settings().map_err(map_config_err)
}

pub fn chat_services() -> Result<ChatServices, String> {
    let root = ensure_state_root()?;
    let settings = load_settings()?;
    ChatServices::from_settings(&settings, &root).map_err(|e| e.to_string())
}

pub fn parse_chat_id(raw: &str) -> Result<ChatId, String> {
    ChatId::parse(raw).map_err(|err| format!("invalid chat id `{raw}`: {err}"))
}
