use super::naming::{format_chat_title, resolve_unique_chat_id};
use super::Message;
use crate::shared::fs_atomic::atomic_write_file;
use crate::shared::ids::ChatId;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to create sessions directory {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to list sessions in {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read session {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse session {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode session {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write session {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to delete session {path}: {source}")]
    Delete {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid chat id: {0}")]
    InvalidChatId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub chat_id: ChatId,
    pub title: String,
    pub modified: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, chat_id: &ChatId) -> PathBuf {
        self.dir.join(chat_id.as_str())
    }

    pub fn contains(&self, chat_id: &ChatId) -> bool {
        self.path_for(chat_id).is_file()
    }

    /// Sessions ordered most recently modified first; ties fall back to name.
    pub fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        let read_dir_err = |source| StoreError::ReadDir {
            path: self.dir.display().to_string(),
            source,
        };
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(read_dir_err)? {
            let entry = entry.map_err(read_dir_err)?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Ok(chat_id) = ChatId::parse(&name) else {
                continue;
            };
            let metadata = entry.metadata().map_err(read_dir_err)?;
            if !metadata.is_file() {
                continue;
            }
            sessions.push(SessionSummary {
                title: format_chat_title(chat_id.as_str()),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                chat_id,
            });
        }
        sessions.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.chat_id.cmp(&b.chat_id))
        });
        Ok(sessions)
    }

    /// A chat id with no file behind it loads as an empty history.
    pub fn load(&self, chat_id: &ChatId) -> Result<Vec<Message>, StoreError> {
        let path = self.path_for(chat_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path).map_err(|source| StoreError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, chat_id: &ChatId, messages: &[Message]) -> Result<(), StoreError> {
        let path = self.path_for(chat_id);
        let body = encode_history(messages).map_err(|source| StoreError::Encode {
            path: path.display().to_string(),
            source,
        })?;
        atomic_write_file(&path, &body).map_err(|source| StoreError::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Returns `false` when there was nothing to delete.
    pub fn delete(&self, chat_id: &ChatId) -> Result<bool, StoreError> {
        let path = self.path_for(chat_id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| StoreError::Delete {
            path: path.display().to_string(),
            source,
        })?;
        Ok(true)
    }

    pub fn unique_chat_id(&self, stem: &str) -> Result<ChatId, StoreError> {
        resolve_unique_chat_id(&self.dir, stem).map_err(StoreError::InvalidChatId)
    }
}

fn encode_history(messages: &[Message]) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut body, formatter);
    messages.serialize(&mut serializer)?;
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    fn id(raw: &str) -> ChatId {
        ChatId::parse(raw).expect("chat id")
    }

    fn set_modified(path: &Path, secs: u64) {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(path)
            .expect("open for mtime");
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .expect("set mtime");
    }

    #[test]
    fn open_creates_missing_sessions_directory() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path().join("a/b/chat_sessions");
        let store = SessionStore::open(&dir).expect("open");
        assert!(dir.is_dir());
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn saved_history_uses_four_space_indent() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open");
        store
            .save(&id("Greeting.json"), &[Message::user("hello")])
            .expect("save");
        let raw = fs::read_to_string(temp.path().join("Greeting.json")).expect("read");
        assert_eq!(
            raw,
            "[\n    {\n        \"role\": \"user\",\n        \"content\": \"hello\"\n    }\n]"
        );
    }

    #[test]
    fn list_orders_by_mtime_descending_and_skips_other_files() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open");
        for (name, secs) in [("old_chat.json", 100), ("newest.json", 300), ("middle.json", 200)] {
            store.save(&id(name), &[]).expect("save");
            set_modified(&temp.path().join(name), secs);
        }
        fs::write(temp.path().join("notes.txt"), "x").expect("write txt");
        fs::create_dir(temp.path().join("folder.json")).expect("mkdir");

        let names: Vec<String> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|s| s.chat_id.to_string())
            .collect();
        assert_eq!(names, vec!["newest.json", "middle.json", "old_chat.json"]);
        assert_eq!(store.list().expect("list")[2].title, "Old chat");
    }

    #[test]
    fn load_missing_session_is_empty_and_malformed_session_errors() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open");
        assert!(store.load(&id("absent.json")).expect("load").is_empty());

        fs::write(temp.path().join("broken.json"), "{not json").expect("write");
        match store.load(&id("broken.json")).expect_err("parse error") {
            StoreError::Parse { path, .. } => assert!(path.ends_with("broken.json")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn delete_reports_whether_a_file_was_removed() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open");
        let chat = id("Doomed.json");
        store.save(&chat, &[Message::user("bye")]).expect("save");
        assert!(store.contains(&chat));
        assert!(store.delete(&chat).expect("delete"));
        assert!(!store.contains(&chat));
        assert!(!store.delete(&chat).expect("delete again"));
    }

    #[test]
    fn unique_chat_id_skips_existing_sessions() {
        let temp = tempdir().expect("tempdir");
        let store = SessionStore::open(temp.path()).expect("open");
        store.save(&id("Chat.json"), &[]).expect("save");
        assert_eq!(store.unique_chat_id("Chat").expect("unique").as_str(), "Chat_1.json");
        assert!(matches!(
            store.unique_chat_id("../escape"),
            Err(StoreError::InvalidChatId(_))
        ));
    }
}
