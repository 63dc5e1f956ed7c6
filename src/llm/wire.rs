use crate::history::Message;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub(crate) model: &'a str,
    pub(crate) messages: &'a [Message],
    pub(crate) stream: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub(crate) message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListModelsResponse {
    #[serde(default)]
    pub(crate) models: Vec<ModelSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl ModelSummary {
    /// `gemma3` matches an installed `gemma3:latest`.
    pub fn matches(&self, model: &str) -> bool {
        self.name == model || self.name.strip_suffix(":latest") == Some(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_disables_streaming_and_forwards_images() {
        let messages = vec![
            Message::user("what is this?").with_image("aGk="),
            Message::assistant("a cat"),
        ];
        let request = ChatRequest {
            model: "llava",
            messages: &messages,
            stream: false,
        };
        let json = serde_json::to_string(&request).expect("encode");
        assert_eq!(
            json,
            r#"{"model":"llava","messages":[{"role":"user","content":"what is this?","images":["aGk="]},{"role":"assistant","content":"a cat"}],"stream":false}"#
        );
    }

    #[test]
    fn chat_response_ignores_extra_fields() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"model":"gemma3","created_at":"2025-01-01T00:00:00Z","message":{"role":"assistant","content":"hi"},"done":true,"total_duration":12}"#,
        )
        .expect("decode");
        assert_eq!(response.message.content, "hi");
    }

    #[test]
    fn model_summary_matches_latest_tag() {
        let model = ModelSummary {
            name: "gemma3:latest".to_string(),
            size: None,
        };
        assert!(model.matches("gemma3"));
        assert!(model.matches("gemma3:latest"));
        assert!(!model.matches("gemma"));
    }
}
