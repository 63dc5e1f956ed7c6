pub mod error;
pub mod load;
pub mod paths;
pub mod save;
pub mod settings;

pub use error::ConfigError;
pub use load::{load_global_settings, load_settings_from};
pub use paths::{
    default_global_config_path, default_state_root_path, GLOBAL_SETTINGS_FILE_NAME,
    GLOBAL_STATE_DIR, SESSIONS_DIR_NAME,
};
pub use save::{save_global_settings, save_settings_to};
pub use settings::{
    normalize_host, Settings, DEFAULT_FALLBACK_TOPIC, DEFAULT_MODEL, DEFAULT_OLLAMA_HOST,
    DEFAULT_REQUEST_TIMEOUT_SECS, ENV_MODEL, ENV_OLLAMA_HOST,
};
