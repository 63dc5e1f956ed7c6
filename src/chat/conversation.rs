use super::attachments::StagedImage;
use super::topic::{generate_topic, Topic};
use crate::config::Settings;
use crate::history::{sanitize_filename, Message, SessionStore, StoreError};
use crate::llm::{ChatModel, LlmError, OllamaClient};
use crate::shared::ids::ChatId;
use crate::shared::logging::EventLog;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message must be non-empty")]
    EmptyMessage,
    #[error("model request failed: {0}")]
    Model(#[from] LlmError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything an exchange talks to, borrowed for the duration of one call.
#[derive(Clone, Copy)]
pub struct ChatContext<'a> {
    pub model: &'a dyn ChatModel,
    pub store: &'a SessionStore,
    pub log: &'a EventLog,
    pub fallback_topic: &'a str,
}

/// Owned wiring for the CLI and TUI; cloneable so an exchange can run off the UI thread.
#[derive(Debug, Clone)]
pub struct ChatServices {
    pub client: OllamaClient,
    pub store: SessionStore,
    pub log: EventLog,
    pub fallback_topic: String,
}

impl ChatServices {
    pub fn from_settings(settings: &Settings, state_root: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            client: OllamaClient::from_settings(settings),
            store: SessionStore::open(settings.resolve_sessions_dir(state_root))?,
            log: EventLog::for_state_root(state_root),
            fallback_topic: settings.fallback_topic.clone(),
        })
    }

    pub fn context(&self) -> ChatContext<'_> {
        ChatContext {
            model: &self.client,
            store: &self.store,
            log: &self.log,
            fallback_topic: &self.fallback_topic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub reply: String,
    pub chat_id: ChatId,
    pub response_time: Duration,
    /// Set only on the exchange that created the session file.
    pub created_from: Option<Topic>,
    pub image_sent: bool,
}

/// The live message sequence and the session it is attached to, if any.
///
/// A new conversation has no chat id. The first completed exchange names it
/// from a generated topic, and that id is kept for every later save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
    active_chat_id: Option<ChatId>,
    staged_image: Option<StagedImage>,
    last_response_time: Option<Duration>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(store: &SessionStore, chat_id: ChatId) -> Result<Self, ChatError> {
        let messages = store.load(&chat_id)?;
        Ok(Self {
            messages,
            active_chat_id: Some(chat_id),
            staged_image: None,
            last_response_time: None,
        })
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn active_chat_id(&self) -> Option<&ChatId> {
        self.active_chat_id.as_ref()
    }

    pub fn staged_image(&self) -> Option<&StagedImage> {
        self.staged_image.as_ref()
    }

    pub fn stage_image(&mut self, image: StagedImage) {
        self.staged_image = Some(image);
    }

    pub fn clear_staged_image(&mut self) -> Option<StagedImage> {
        self.staged_image.take()
    }

    pub fn last_response_time(&self) -> Option<Duration> {
        self.last_response_time
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn select(&mut self, store: &SessionStore, chat_id: ChatId) -> Result<(), ChatError> {
        *self = Self::open(store, chat_id)?;
        Ok(())
    }

    /// Detaches from `chat_id` after its file was removed. Returns whether it was active.
    pub fn forget(&mut self, chat_id: &ChatId) -> bool {
        if self.active_chat_id.as_ref() == Some(chat_id) {
            self.reset();
            return true;
        }
        false
    }

    /// Sends `prompt` (with any staged image), records the reply and saves the session.
    ///
    /// On a model or store failure the turn is dropped and the staged image
    /// kept, leaving the conversation as it was before the call.
    pub fn submit(
        &mut self,
        ctx: ChatContext<'_>,
        prompt: &str,
    ) -> Result<ExchangeOutcome, ChatError> {
        if prompt.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let turn_start = self.messages.len();
        let previous_response_time = self.last_response_time;
        let mut user_message = Message::user(prompt);
        let image_sent = match &self.staged_image {
            Some(image) => {
                user_message = user_message.with_image(image.base64.clone());
                true
            }
            None => false,
        };
        self.messages.push(user_message);

        let started = Instant::now();
        let reply = match ctx.model.chat(&self.messages) {
            Ok(reply) => reply,
            Err(err) => {
                self.messages.truncate(turn_start);
                ctx.log.warn(
                    "exchange.failed",
                    &format!("model={} error={err}", ctx.model.model_name()),
                );
                return Err(err.into());
            }
        };
        let response_time = started.elapsed();
        self.last_response_time = Some(response_time);
        self.messages.push(Message::assistant(reply.clone()));

        let (chat_id, created_from) = match self.persist(ctx) {
            Ok(saved) => saved,
            Err(err) => {
                self.messages.truncate(turn_start);
                self.last_response_time = previous_response_time;
                ctx.log.warn("exchange.failed", &format!("error={err}"));
                return Err(err.into());
            }
        };
        if created_from.is_some() {
            self.active_chat_id = Some(chat_id.clone());
            ctx.log
                .info("session.created", &format!("chat_id={chat_id}"));
        }
        if image_sent {
            self.staged_image = None;
        }
        ctx.log.info(
            "exchange.completed",
            &format!(
                "chat_id={chat_id} model={} response_time={}",
                ctx.model.model_name(),
                format_response_time(response_time)
            ),
        );

        Ok(ExchangeOutcome {
            reply,
            chat_id,
            response_time,
            created_from,
            image_sent,
        })
    }

    /// Names a new session from a generated topic, then writes the history.
    fn persist(&self, ctx: ChatContext<'_>) -> Result<(ChatId, Option<Topic>), StoreError> {
        let (chat_id, created_from) = match &self.active_chat_id {
            Some(chat_id) => (chat_id.clone(), None),
            None => {
                let topic = generate_topic(ctx.model, &self.messages, ctx.fallback_topic);
                if let Topic::Fallback { reason, .. } = &topic {
                    ctx.log.warn("topic.fallback", reason);
                }
                let chat_id = ctx.store.unique_chat_id(&sanitize_filename(topic.label()))?;
                (chat_id, Some(topic))
            }
        };
        ctx.store.save(&chat_id, &self.messages)?;
        Ok((chat_id, created_from))
    }
}

/// Seconds rounded to one decimal, e.g. `2.4s`.
pub fn format_response_time(elapsed: Duration) -> String {
    format!("{:.1}s", elapsed.as_secs_f64())
}
