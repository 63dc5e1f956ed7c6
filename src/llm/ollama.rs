use super::wire::{ChatRequest, ChatResponse, ListModelsResponse, ModelSummary};
use super::{ChatModel, LlmError};
use crate::config::{normalize_host, Settings};
use crate::history::Message;
use std::time::Duration;

/// Blocking client for the Ollama HTTP API.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    agent: ureq::Agent,
}

impl OllamaClient {
    pub fn new(host: &str, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: normalize_host(host),
            model: model.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.ollama_host,
            settings.model.clone(),
            settings.request_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub fn list_models(&self) -> Result<Vec<ModelSummary>, LlmError> {
        let url = self.endpoint("api/tags");
        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|err| call_error(&url, err))?;
        let listing: ListModelsResponse =
            response
                .into_json()
                .map_err(|err| LlmError::InvalidResponse {
                    url: url.clone(),
                    reason: err.to_string(),
                })?;
        Ok(listing.models)
    }
}

impl ChatModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let url = self.endpoint("api/chat");
        let body = serde_json::to_value(ChatRequest {
            model: &self.model,
            messages,
            stream: false,
        })
        .map_err(|err| LlmError::InvalidResponse {
            url: url.clone(),
            reason: format!("failed to encode request: {err}"),
        })?;
        let response = self
            .agent
            .post(&url)
            .send_json(body)
            .map_err(|err| call_error(&url, err))?;
        let reply: ChatResponse = response
            .into_json()
            .map_err(|err| LlmError::InvalidResponse {
                url: url.clone(),
                reason: err.to_string(),
            })?;
        Ok(reply.message.content)
    }
}

fn call_error(url: &str, err: ureq::Error) -> LlmError {
    match err {
        ureq::Error::Status(status, response) => LlmError::Status {
            url: url.to_string(),
            status,
            body: response.into_string().unwrap_or_default().trim().to_string(),
        },
        ureq::Error::Transport(transport) => LlmError::Transport {
            url: url.to_string(),
            reason: transport.to_string(),
        },
    }
}
