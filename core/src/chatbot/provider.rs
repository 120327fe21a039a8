//! Vendor request and response shapes.
//!
//! OpenAI and Custom endpoints take an OpenAI-style body. Anthropic takes
//! the system prompt as a separate field. Custom replies are parsed
//! leniently: any of the known shapes, then the first `content`/`text`
//! string found anywhere in the body.

use super::{ChatMessage, ChatRequest, Role};
use crate::error::{ChatError, GameError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Custom,
}

impl Provider {
    /// Endpoint used when nothing overrides it. Custom starts from the OpenAI URL.
    pub fn default_endpoint(&self) -> &'static str {
        self.known_endpoint().unwrap_or(OPENAI_ENDPOINT)
    }

    /// The vendor's own endpoint, if the provider has one.
    pub fn known_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi    => Some(OPENAI_ENDPOINT),
            Self::Anthropic => Some(ANTHROPIC_ENDPOINT),
            Self::Custom    => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAi    => "openai",
            Self::Anthropic => "anthropic",
            Self::Custom    => "custom",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Provider {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "anthropic"          => Ok(Self::Anthropic),
            "custom"             => Ok(Self::Custom),
            other => Err(GameError::InvalidConfig(format!("unknown chatbot provider '{other}'"))),
        }
    }
}

// ── Request bodies ─────────────────────────────────────────────────

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model:       &'a str,
    messages:    &'a [ChatMessage],
    temperature: f64,
    max_tokens:  u32,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model:       &'a str,
    max_tokens:  u32,
    #[serde(skip_serializing_if = "String::is_empty")]
    system:      String,
    messages:    Vec<&'a ChatMessage>,
    temperature: f64,
}

pub fn build_request_body(provider: Provider, request: &ChatRequest) -> Result<serde_json::Value, ChatError> {
    let body = match provider {
        Provider::OpenAi | Provider::Custom => serde_json::to_value(OpenAiRequest {
            model:       &request.model,
            messages:    &request.messages,
            temperature: request.temperature,
            max_tokens:  request.max_tokens,
        }),
        Provider::Anthropic => {
            let system = request
                .messages
                .iter()
                .filter(|m| m.role == Role::System)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            serde_json::to_value(AnthropicRequest {
                model:       &request.model,
                max_tokens:  request.max_tokens,
                system,
                messages:    request.messages.iter().filter(|m| m.role != Role::System).collect(),
                temperature: request.temperature,
            })
        }
    };
    body.map_err(|e| ChatError::Malformed(format!("cannot encode request: {e}")))
}

/// Headers that carry the API key for each provider.
pub fn auth_headers(provider: Provider, api_key: &str) -> Vec<(&'static str, String)> {
    match provider {
        Provider::OpenAi | Provider::Custom => {
            vec![("Authorization", format!("Bearer {api_key}"))]
        }
        Provider::Anthropic => vec![
            ("x-api-key", api_key.to_string()),
            ("anthropic-version", ANTHROPIC_VERSION.to_string()),
        ],
    }
}

// ── Response bodies ────────────────────────────────────────────────

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

fn openai_text(body: &str) -> Result<String, ChatError> {
    let parsed: OpenAiResponse =
        serde_json::from_str(body).map_err(|e| ChatError::Malformed(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| ChatError::Malformed("no choices in response".into()))
}

fn anthropic_text(body: &str) -> Result<String, ChatError> {
    let parsed: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| ChatError::Malformed(e.to_string()))?;
    parsed
        .content
        .into_iter()
        .find_map(|c| c.text)
        .ok_or_else(|| ChatError::Malformed("no text block in response".into()))
}

/// Depth-first search for the first string under a `content` or `text` key.
fn find_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Object(map) => {
            for key in ["content", "text"] {
                if let Some(serde_json::Value::String(s)) = map.get(key) {
                    return Some(s.clone());
                }
            }
            map.values().find_map(find_text)
        }
        serde_json::Value::Array(items) => items.iter().find_map(find_text),
        _ => None,
    }
}

fn generic_text(body: &str) -> Result<String, ChatError> {
    openai_text(body).or_else(|_| anthropic_text(body)).or_else(|_| {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| ChatError::Malformed(e.to_string()))?;
        find_text(&value).ok_or_else(|| ChatError::Malformed("no reply text found".into()))
    })
}

/// Extract the reply text from a successful response body.
pub fn parse_reply(provider: Provider, body: &str) -> Result<String, ChatError> {
    let text = match provider {
        Provider::OpenAi    => openai_text(body)?,
        Provider::Anthropic => anthropic_text(body)?,
        Provider::Custom    => generic_text(body)?,
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::Malformed("empty reply".into()));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            messages: vec![
                ChatMessage::new(Role::System, "Stay in character."),
                ChatMessage::new(Role::User, "Nice weather?"),
                ChatMessage::new(Role::Assistant, "Sure is."),
                ChatMessage::new(Role::User, "You from around here?"),
            ],
            model:       "test-model".into(),
            temperature: 0.8,
            max_tokens:  150,
        }
    }

    #[test]
    fn openai_body_keeps_system_in_messages() {
        let body = build_request_body(Provider::OpenAi, &request()).unwrap();
        assert_eq!(body["model"], "test-model");
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["messages"].as_array().unwrap().len(), 4);
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[test]
    fn anthropic_body_splits_system_prompt() {
        let body = build_request_body(Provider::Anthropic, &request()).unwrap();
        assert_eq!(body["system"], "Stay in character.");
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m["role"] != "system"));
    }

    #[test]
    fn anthropic_headers_carry_version() {
        let headers = auth_headers(Provider::Anthropic, "k");
        assert!(headers.contains(&("x-api-key", "k".to_string())));
        assert!(headers.contains(&("anthropic-version", "2023-06-01".to_string())));
        assert_eq!(auth_headers(Provider::OpenAi, "k")[0].1, "Bearer k");
    }

    #[test]
    fn parses_vendor_replies() {
        let openai = r#"{"choices":[{"message":{"role":"assistant","content":" Just a trim. "}}]}"#;
        assert_eq!(parse_reply(Provider::OpenAi, openai).unwrap(), "Just a trim.");

        let anthropic = r#"{"content":[{"type":"text","text":"Why do you ask?"}]}"#;
        assert_eq!(parse_reply(Provider::Anthropic, anthropic).unwrap(), "Why do you ask?");

        let custom = r#"{"data":{"reply":{"text":"Mmhmm."}}}"#;
        assert_eq!(parse_reply(Provider::Custom, custom).unwrap(), "Mmhmm.");
    }

    #[test]
    fn malformed_replies_are_errors() {
        assert!(matches!(parse_reply(Provider::OpenAi, "not json"), Err(ChatError::Malformed(_))));
        assert!(matches!(parse_reply(Provider::OpenAi, r#"{"choices":[]}"#), Err(ChatError::Malformed(_))));
        let empty = r#"{"content":[{"type":"text","text":"   "}]}"#;
        assert!(matches!(parse_reply(Provider::Anthropic, empty), Err(ChatError::Malformed(_))));
    }

    #[test]
    fn provider_names_parse_case_insensitively() {
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!("ANTHROPIC".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert!("bard".parse::<Provider>().is_err());
    }
}
