use super::{ConfigError, SESSIONS_DIR_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemma3";
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_FALLBACK_TOPIC: &str = "Chat";

pub const ENV_OLLAMA_HOST: &str = "OLLAMA_HOST";
pub const ENV_MODEL: &str = "WANDEE_MODEL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_fallback_topic")]
    pub fallback_topic: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_ollama_host() -> String {
    DEFAULT_OLLAMA_HOST.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_fallback_topic() -> String {
    DEFAULT_FALLBACK_TOPIC.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: default_model(),
            ollama_host: default_ollama_host(),
            sessions_dir: None,
            request_timeout_secs: default_request_timeout_secs(),
            fallback_topic: default_fallback_topic(),
        }
    }
}

impl Settings {
    /// A missing or empty file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_OLLAMA_HOST).filter(|v| !v.trim().is_empty()) {
            self.ollama_host = host;
        }
        if let Some(model) = lookup(ENV_MODEL).filter(|v| !v.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Settings("model must be non-empty".to_string()));
        }
        if self.ollama_host.trim().is_empty() {
            return Err(ConfigError::Settings(
                "ollama_host must be non-empty".to_string(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Settings(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.fallback_topic.trim().is_empty() {
            return Err(ConfigError::Settings(
                "fallback_topic must be non-empty".to_string(),
            ));
        }
        if let Some(dir) = &self.sessions_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Settings(
                    "sessions_dir must be non-empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Relative `sessions_dir` values resolve against the state root.
    pub fn resolve_sessions_dir(&self, state_root: &Path) -> PathBuf {
        match &self.sessions_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => state_root.join(dir),
            None => state_root.join(SESSIONS_DIR_NAME),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ollama_base_url(&self) -> String {
        normalize_host(&self.ollama_host)
    }
}

/// Accepts the same shapes as `OLLAMA_HOST`: `host`, `host:port` or a full URL.
pub fn normalize_host(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    #[test]
    fn missing_settings_file_yields_defaults() {
        let temp = tempdir().expect("tempdir");
        let settings = Settings::from_path(&temp.path().join("config.yaml")).expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model, "gemma3");
        assert_eq!(settings.fallback_topic, "Chat");
    }

    #[test]
    fn partial_settings_fill_remaining_defaults() {
        let settings: Settings = serde_yaml::from_str(
            r#"
model: llava
request_timeout_secs: 30
"#,
        )
        .expect("parse settings");
        assert_eq!(settings.model, "llava");
        assert_eq!(settings.request_timeout_secs, 30);
        assert_eq!(settings.ollama_host, DEFAULT_OLLAMA_HOST);
        assert!(settings.sessions_dir.is_none());
    }

    #[test]
    fn env_overrides_replace_host_and_model_but_ignore_blanks() {
        let env = BTreeMap::from([
            (ENV_OLLAMA_HOST, "10.0.0.5:11434".to_string()),
            (ENV_MODEL, "  ".to_string()),
        ]);
        let settings =
            Settings::default().with_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.ollama_host, "10.0.0.5:11434");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.ollama_base_url(), "http://10.0.0.5:11434");
    }

    #[test]
    fn validation_rejects_zero_timeout_and_blank_fallback() {
        let settings = Settings {
            request_timeout_secs: 0,
            ..Settings::default()
        };
        match settings.validate().expect_err("zero timeout") {
            ConfigError::Settings(message) => assert!(message.contains("request_timeout_secs")),
            other => panic!("unexpected error: {other:?}"),
        }

        let settings = Settings {
            fallback_topic: " ".to_string(),
            ..Settings::default()
        };
        match settings.validate().expect_err("blank fallback") {
            ConfigError::Settings(message) => assert!(message.contains("fallback_topic")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn sessions_dir_resolves_relative_to_state_root() {
        let root = Path::new("/home/user/.wandee");
        assert_eq!(
            Settings::default().resolve_sessions_dir(root),
            root.join("chat_sessions")
        );
        let relative = Settings {
            sessions_dir: Some(PathBuf::from("archive")),
            ..Settings::default()
        };
        assert_eq!(relative.resolve_sessions_dir(root), root.join("archive"));
        let absolute = Settings {
            sessions_dir: Some(PathBuf::from("/srv/chats")),
            ..Settings::default()
        };
        assert_eq!(
            absolute.resolve_sessions_dir(root),
            PathBuf::from("/srv/chats")
        );
    }

    #[test]
    fn normalize_host_adds_scheme_and_trims_slashes() {
        assert_eq!(normalize_host("localhost:11434"), "http://localhost:11434");
        assert_eq!(
            normalize_host("https://ollama.lan/"),
            "https://ollama.lan"
        );
    }

    #[test]
    fn settings_round_trip_through_saved_yaml() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("nested/config.yaml");
        let settings = Settings {
            model: "llava:13b".to_string(),
            sessions_dir: Some(PathBuf::from("/tmp/chats")),
            ..Settings::default()
        };
        crate::config::save_settings_to(&path, &settings).expect("save");
        assert_eq!(Settings::from_path(&path).expect("load"), settings);
    }
}
