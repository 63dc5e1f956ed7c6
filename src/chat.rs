pub mod attachments;
pub mod conversation;
pub mod topic;

pub use attachments::{
    decode_image, stage_image, AttachmentError, StagedImage, SUPPORTED_IMAGE_EXTENSIONS,
};
pub use conversation::{
    format_response_time, ChatContext, ChatError, ChatServices, Conversation, ExchangeOutcome,
};
pub use topic::{generate_topic, topic_request, Topic, TOPIC_INSTRUCTION};
