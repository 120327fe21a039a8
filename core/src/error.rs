use crate::dialogue::DialogueCategory;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("Insufficient customer templates: requested {requested}, only {available} available")]
    InsufficientTemplates { requested: usize, available: usize },

    #[error("No suspect profiles configured")]
    NoSuspects,

    #[error("Dialogue pool '{owner}' has no {category} lines")]
    EmptyPool { owner: String, category: DialogueCategory },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type GameResult<T> = Result<T, GameError>;

/// Failures signalled by the chatbot collaborator.
/// None of these are fatal: callers map every variant to a fallback reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error("Chatbot not configured (missing or placeholder API key)")]
    Unconfigured,

    #[error("Rate limited: {elapsed:.2}s since last request, minimum is {min_interval:.2}s")]
    RateLimited { elapsed: f64, min_interval: f64 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}
