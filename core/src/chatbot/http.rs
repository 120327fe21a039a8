//! Blocking HTTP transport for the chatbot.

use super::{
    provider::{auth_headers, build_request_body, parse_reply, Provider},
    ChatBackend, ChatRequest,
};
use crate::{config::ChatbotConfig, error::ChatError};
use std::time::Duration;

/// Longest error body kept in `ChatError::Status`.
const MAX_ERROR_BODY: usize = 300;

const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

impl From<reqwest::Error> for ChatError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ChatError::Timeout
        } else {
            ChatError::Transport(e.to_string())
        }
    }
}

pub struct HttpChatBackend {
    client:   reqwest::blocking::Client,
    provider: Provider,
    endpoint: String,
    api_key:  String,
}

impl HttpChatBackend {
    /// Build a client for the configured provider. Fails without a usable key.
    pub fn new(config: &ChatbotConfig) -> Result<Self, ChatError> {
        if !config.is_configured() {
            return Err(ChatError::Unconfigured);
        }
        let api_key = config.api_key.clone().ok_or(ChatError::Unconfigured)?;
        let timeout = if config.request_timeout_secs.is_finite() && config.request_timeout_secs > 0.0 {
            config.request_timeout_secs
        } else {
            DEFAULT_TIMEOUT_SECS
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs_f64(timeout))
            .build()?;
        Ok(Self {
            client,
            provider: config.provider,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

impl ChatBackend for HttpChatBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn complete(&mut self, request: &ChatRequest) -> Result<String, ChatError> {
        let body = build_request_body(self.provider, request)?;
        let mut builder = self.client.post(&self.endpoint).json(&body);
        for (name, value) in auth_headers(self.provider, &self.api_key) {
            builder = builder.header(name, value);
        }

        log::debug!("POST {} ({} messages)", self.endpoint, request.messages.len());
        let response = builder.send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            let body: String = text.chars().take(MAX_ERROR_BODY).collect();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_reply(self.provider, &text)
    }
}
