use crate::history::Message;
use crate::llm::ChatModel;

pub const TOPIC_INSTRUCTION: &str = "Based on our conversation so far, what is a short, descriptive topic for this chat? The topic should be less than 10 words. Reply with only the topic itself, and nothing else.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topic {
    Generated(String),
    Fallback { label: String, reason: String },
}

impl Topic {
    pub fn label(&self) -> &str {
        match self {
            Self::Generated(label) => label,
            Self::Fallback { label, .. } => label,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// The history plus one trailing instruction asking for a topic. The live
/// conversation is left untouched.
pub fn topic_request(messages: &[Message]) -> Vec<Message> {
    let mut request = messages.to_vec();
    request.push(Message::user(TOPIC_INSTRUCTION));
    request
}

pub fn generate_topic(model: &dyn ChatModel, messages: &[Message], fallback: &str) -> Topic {
    match model.chat(&topic_request(messages)) {
        Ok(label) => Topic::Generated(label),
        Err(err) => Topic::Fallback {
            label: fallback.to_string(),
            reason: err.to_string(),
        },
    }
}
