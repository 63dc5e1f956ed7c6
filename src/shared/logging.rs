use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn chat_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/chat.log")
}

/// Best-effort JSON-lines event log. A disabled log drops every event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn for_state_root(state_root: &Path) -> Self {
        Self {
            path: Some(chat_log_path(state_root)),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, event: &str, message: &str) {
        self.append("info", event, message);
    }

    pub fn warn(&self, event: &str, message: &str) {
        self.append("warn", event, message);
    }

    fn append(&self, level: &str, event: &str, message: &str) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        let payload = json!({
            "timestamp": now_secs(),
            "level": level,
            "event": event,
            "message": message,
        });
        let Ok(line) = serde_json::to_string(&payload) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        let Ok(mut file) = fs::OpenOptions::new().create(true).append(true).open(path) else {
            return;
        };
        let _ = writeln!(file, "{line}");
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
