//! CLI error types and conversions

use serde_json::Value;

use crate::client::ClientError;
use crate::identifier::IdentifierError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Failure reported by the REST client or the server
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Identifier error
    #[error("identifier error: {0}")]
    IdentifierError(#[from] IdentifierError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Local file error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The command found nothing to act on
    #[error("{0}")]
    NotFound(String),

    /// Stopped by Ctrl+C
    #[error("interrupted: {0}")]
    Interrupted(String),
}

impl CliError {
    /// The server's JSON diagnostic, when the failure carried one
    pub fn diagnostic(&self) -> Option<&Value> {
        match self {
            CliError::Client(e) => e.response(),
            _ => None,
        }
    }
}
