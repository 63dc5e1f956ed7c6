use crate::shared::ids::ChatId;
use std::path::Path;

pub const MAX_TOPIC_CHARS: usize = 50;
pub const DEFAULT_CHAT_STEM: &str = "new_chat";

/// Turns a free-form topic into a file stem: keeps letters, digits, whitespace,
/// `-` and `_`, joins words with `_` and caps the result at 50 characters.
pub fn sanitize_filename(topic: &str) -> String {
    let kept: String = topic
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace() || *ch == '-' || *ch == '_')
        .collect();
    let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        return DEFAULT_CHAT_STEM.to_string();
    }
    joined.chars().take(MAX_TOPIC_CHARS).collect()
}

/// First of `<stem>.json`, `<stem>_1.json`, `<stem>_2.json`, ... not present in `dir`.
pub fn resolve_unique_chat_id(dir: &Path, stem: &str) -> Result<ChatId, String> {
    let mut candidate = ChatId::from_stem(stem)?;
    let mut suffix = 1u32;
    while dir.join(candidate.as_str()).exists() {
        candidate = ChatId::from_stem(&format!("{stem}_{suffix}"))?;
        suffix += 1;
    }
    Ok(candidate)
}

pub fn format_chat_title(chat_id: &str) -> String {
    let spaced = chat_id.replace(".json", "").replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn sanitize_strips_punctuation_and_joins_words() {
        assert_eq!(
            sanitize_filename("  \"Rust: borrowing & lifetimes!\"  "),
            "Rust_borrowing_lifetimes"
        );
        assert_eq!(sanitize_filename("multi\nline\ttopic"), "multi_line_topic");
        assert_eq!(sanitize_filename("keep-dashes_and_underscores"), "keep-dashes_and_underscores");
    }

    #[test]
    fn sanitize_keeps_unicode_letters() {
        assert_eq!(sanitize_filename("Café résumé tips"), "Café_résumé_tips");
    }

    #[test]
    fn sanitize_falls_back_when_nothing_survives() {
        assert_eq!(sanitize_filename(""), DEFAULT_CHAT_STEM);
        assert_eq!(sanitize_filename("?!  ..."), DEFAULT_CHAT_STEM);
    }

    #[test]
    fn sanitize_never_exceeds_fifty_characters() {
        let long = "word ".repeat(40);
        let stem = sanitize_filename(&long);
        assert_eq!(stem.chars().count(), MAX_TOPIC_CHARS);

        let wide = "ü".repeat(80);
        assert_eq!(sanitize_filename(&wide).chars().count(), MAX_TOPIC_CHARS);
    }

    #[test]
    fn unique_chat_id_appends_incrementing_suffix() {
        let temp = tempdir().expect("tempdir");
        let first = resolve_unique_chat_id(temp.path(), "Trip").expect("first");
        assert_eq!(first.as_str(), "Trip.json");

        fs::write(temp.path().join("Trip.json"), "[]").expect("write");
        fs::write(temp.path().join("Trip_1.json"), "[]").expect("write");
        let next = resolve_unique_chat_id(temp.path(), "Trip").expect("next");
        assert_eq!(next.as_str(), "Trip_2.json");
        assert!(!temp.path().join(next.as_str()).exists());
    }

    #[test]
    fn chat_title_is_readable() {
        assert_eq!(format_chat_title("rust_LIFETIMES_help.json"), "Rust lifetimes help");
        assert_eq!(format_chat_title("new_chat_2.json"), "New chat 2");
        assert_eq!(format_chat_title(""), "");
    }
}
