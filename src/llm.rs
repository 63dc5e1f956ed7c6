use crate::history::Message;

pub mod ollama;
pub mod wire;

pub use ollama::OllamaClient;
pub use wire::ModelSummary;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("model service at {url} returned status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

/// A chat-completion backend: takes the whole history, returns the reply text.
pub trait ChatModel {
    fn model_name(&self) -> &str;

    fn chat(&self, messages: &[Message]) -> Result<String, LlmError>;
}
