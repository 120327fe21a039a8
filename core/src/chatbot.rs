//! Chatbot collaborator — in-character replies from a remote model.
//!
//! RULE: The chatbot can never stall or break a conversation. Every call
//! to `send` returns a reply: the model's, a canned fallback, or "...".
//!
//! Failure handling:
//!   - no usable API key      → fallback, warned once
//!   - inside the rate window → fallback
//!   - transport/parse error  → fallback if `use_fallback_on_error`,
//!                              else the "..." placeholder
//!
//! The remote call goes through `ChatBackend`, so tests and the offline
//! runner can swap in their own backend.

pub mod http;
pub mod provider;

pub use http::HttpChatBackend;
pub use provider::Provider;

use crate::{
    config::ChatbotConfig,
    customer::CustomerInstance,
    dialogue::{DialogueCategory, DialoguePool},
    error::ChatError,
    rng::StreamRng,
    types::Seconds,
};
use serde::{Deserialize, Serialize};

/// Reply used when a request fails and fallbacks are switched off.
pub const PLACEHOLDER_REPLY: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role:    Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Provider-neutral request. Backends shape it for their vendor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub messages:    Vec<ChatMessage>,
    pub model:       String,
    pub temperature: f64,
    pub max_tokens:  u32,
}

pub trait ChatBackend {
    fn name(&self) -> &'static str {
        "backend"
    }

    fn complete(&mut self, request: &ChatRequest) -> Result<String, ChatError>;
}

/// Backend for sessions without network access. Every call fails as unconfigured.
#[derive(Debug, Default)]
pub struct OfflineBackend;

impl ChatBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn complete(&mut self, _request: &ChatRequest) -> Result<String, ChatError> {
        Err(ChatError::Unconfigured)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    Unconfigured,
    RateLimited,
    Failed,
}

impl FallbackReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::RateLimited  => "rate_limited",
            Self::Failed       => "failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Chatbot,
    Fallback(FallbackReason),
    /// The request failed and fallbacks are disabled.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub text:   String,
    pub source: ReplySource,
}

pub struct ChatbotService {
    config:              ChatbotConfig,
    backend:             Box<dyn ChatBackend>,
    fallback:            DialoguePool,
    history:             Vec<ChatMessage>,
    last_request_at:     Option<Seconds>,
    warned_unconfigured: bool,
    failures:            u32,
    last_error:          Option<ChatError>,
}

impl ChatbotService {
    pub fn new(config: ChatbotConfig, backend: Box<dyn ChatBackend>, fallback: DialoguePool) -> Self {
        log::debug!(
            "Chatbot service: provider {}, backend {}, configured {}",
            config.provider,
            backend.name(),
            config.is_configured()
        );
        Self {
            config,
            backend,
            fallback,
            history:             Vec::new(),
            last_request_at:     None,
            warned_unconfigured: false,
            failures:            0,
            last_error:          None,
        }
    }

    pub fn config(&self) -> &ChatbotConfig {
        &self.config
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn last_error(&self) -> Option<&ChatError> {
        self.last_error.as_ref()
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Reset the transcript for a new customer: system prompt plus character sheet.
    pub fn start_conversation(&mut self, customer: &CustomerInstance) {
        self.history.clear();
        let system = format!("{}\n\n{}", self.config.system_prompt, customer.personality_prompt());
        self.history.push(ChatMessage::new(Role::System, system));
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Get a reply to `player_line` at game time `now`.
    pub fn send(
        &mut self,
        player_line: &str,
        category: DialogueCategory,
        now: Seconds,
        rng: &mut StreamRng,
    ) -> ChatReply {
        self.respond(player_line, category, now, rng, None)
    }

    /// Like `send`, but answers with `local` whenever the chatbot cannot be
    /// asked at all (unconfigured or rate limited). A failed request still
    /// falls back to the canned pool.
    pub fn send_or_local(
        &mut self,
        player_line: &str,
        category: DialogueCategory,
        now: Seconds,
        rng: &mut StreamRng,
        local: String,
    ) -> ChatReply {
        self.respond(player_line, category, now, rng, Some(local))
    }

    fn respond(
        &mut self,
        player_line: &str,
        category: DialogueCategory,
        now: Seconds,
        rng: &mut StreamRng,
        local: Option<String>,
    ) -> ChatReply {
        let reply = match self.check_ready(now) {
            Err(ChatError::Unconfigured) => {
                if !self.warned_unconfigured {
                    log::warn!("Chatbot API not configured; using local replies");
                    self.warned_unconfigured = true;
                }
                self.skipped_reply(category, FallbackReason::Unconfigured, local, rng)
            }
            Err(e) => {
                log::debug!("{e}; using fallback");
                self.skipped_reply(category, FallbackReason::RateLimited, local, rng)
            }
            Ok(()) => self.request(player_line, category, now, rng, local),
        };

        self.history.push(ChatMessage::new(Role::User, player_line));
        self.history.push(ChatMessage::new(Role::Assistant, reply.text.clone()));
        reply
    }

    fn check_ready(&self, now: Seconds) -> Result<(), ChatError> {
        if !self.config.is_configured() {
            return Err(ChatError::Unconfigured);
        }
        if let Some(last) = self.last_request_at {
            let elapsed = now - last;
            if elapsed < self.config.min_request_interval {
                return Err(ChatError::RateLimited {
                    elapsed,
                    min_interval: self.config.min_request_interval,
                });
            }
        }
        Ok(())
    }

    fn request(
        &mut self,
        player_line: &str,
        category: DialogueCategory,
        now: Seconds,
        rng: &mut StreamRng,
        local: Option<String>,
    ) -> ChatReply {
        self.last_request_at = Some(now);
        let mut messages = self.history.clone();
        messages.push(ChatMessage::new(Role::User, player_line));
        let request = ChatRequest {
            messages,
            model:       self.config.model.clone(),
            temperature: self.config.temperature,
            max_tokens:  self.config.max_tokens,
        };

        match self.backend.complete(&request) {
            Ok(text) => ChatReply {
                text,
                source: ReplySource::Chatbot,
            },
            Err(ChatError::Unconfigured) => {
                log::debug!("Backend {} is offline; using local reply", self.backend.name());
                self.skipped_reply(category, FallbackReason::Unconfigured, local, rng)
            }
            Err(e) => {
                log::warn!("Chatbot request failed ({}): {e}", self.backend.name());
                self.failures += 1;
                self.last_error = Some(e);
                if self.config.use_fallback_on_error {
                    self.fallback_reply(category, FallbackReason::Failed, rng)
                } else {
                    ChatReply {
                        text:   PLACEHOLDER_REPLY.to_string(),
                        source: ReplySource::Placeholder,
                    }
                }
            }
        }
    }

    fn skipped_reply(
        &self,
        category: DialogueCategory,
        reason: FallbackReason,
        local: Option<String>,
        rng: &mut StreamRng,
    ) -> ChatReply {
        match local {
            Some(text) => ChatReply {
                text,
                source: ReplySource::Fallback(reason),
            },
            None => self.fallback_reply(category, reason, rng),
        }
    }

    /// A canned reply for the category. Never empty.
    pub fn fallback_reply(
        &self,
        category: DialogueCategory,
        reason: FallbackReason,
        rng: &mut StreamRng,
    ) -> ChatReply {
        let text = self
            .fallback
            .pick(category, rng)
            .unwrap_or(PLACEHOLDER_REPLY)
            .to_string();
        ChatReply {
            text,
            source: ReplySource::Fallback(reason),
        }
    }
}
