pub const CHAT_FILE_EXTENSION: &str = ".json";

pub fn validate_chat_id(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err("chat id must be non-empty".to_string());
    }
    let Some(stem) = value.strip_suffix(CHAT_FILE_EXTENSION) else {
        return Err(format!("chat id must end with `{CHAT_FILE_EXTENSION}`"));
    };
    if stem.is_empty() {
        return Err("chat id must have a name before the extension".to_string());
    }
    if value.starts_with('.') || value.contains(['/', '\\', '\0']) {
        return Err("chat id must be a plain file name".to_string());
    }
    Ok(())
}

/// File name of a persisted session, e.g. `Rust_lifetimes.json`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChatId(String);

impl ChatId {
    pub fn parse(raw: &str) -> Result<Self, String> {
        validate_chat_id(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn from_stem(stem: &str) -> Result<Self, String> {
        Self::parse(&format!("{stem}{CHAT_FILE_EXTENSION}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::ChatId;

    #[test]
    fn chat_id_requires_json_file_name_without_separators() {
        assert!(ChatId::parse("Rust_help.json").is_ok());
        assert!(ChatId::parse("Rust_help").is_err());
        assert!(ChatId::parse(".json").is_err());
        assert!(ChatId::parse("../escape.json").is_err());
        assert!(ChatId::parse("nested/topic.json").is_err());
        assert!(ChatId::parse(".hidden.json").is_err());
    }

    #[test]
    fn chat_id_from_stem_appends_extension() {
        let id = ChatId::from_stem("Trip_planning_2").expect("id");
        assert_eq!(id.as_str(), "Trip_planning_2.json");
        assert!(ChatId::from_stem("").is_err());
    }
}
