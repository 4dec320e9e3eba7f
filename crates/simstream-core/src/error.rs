//! Stream errors

use thiserror::Error;

use crate::protocol::DecodeError;

/// Errors raised by the streaming client
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    #[error("WebSocket error: {0}")]
    Transport(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Connection closed abnormally (code {code})")]
    AbnormalClose { code: u16 },

    #[error(transparent)]
    Malformed(#[from] DecodeError),

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;
