// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Every variant is fatal; the previous export stays untouched on failure

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Rate-limit header {name} missing or invalid: {value:?}")]
    RateLimitHeader { name: String, value: Option<String> },

    #[error("Malformed user reference: {0:?}")]
    MalformedReference(String),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Records out of order: {user_id} created {created} after {previous}")]
    OutOfOrder {
        user_id: String,
        created: String,
        previous: String,
    },
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) => 2,
            Error::Transport(_) => 3,
            Error::Api { .. } => 4,
            Error::Decode(_) | Error::RateLimitHeader { .. } => 5,
            Error::MalformedReference(_) => 6,
            Error::Io(_) | Error::Csv(_) => 7,
            Error::OutOfOrder { .. } => 8,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
