//! Client errors and error-response decoding

use reqwest::StatusCode;
use serde_json::Value;

/// Errors raised by the REST client and the resource facades
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Local validation failure, never sent to the server
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Could not reach the server at all
    #[error("network error: {0}")]
    NetworkError(String),

    /// Non-2xx response with a parseable JSON body
    #[error("API error {status}: {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Diagnostic message extracted from the body
        message: String,
        /// Full JSON error body
        response: Value,
    },

    /// Non-2xx response without a parseable JSON body
    #[error("HTTP error {status}")]
    HttpError {
        /// HTTP status code
        status: u16,
    },

    /// A 2xx body that does not match the expected shape
    #[error("parse error: {0}")]
    ParseError(String),

    /// `get_redirect` was answered without a `Location` header
    #[error("expected a redirect from {0}")]
    MissingRedirect(String),

    /// Local file error while uploading or downloading
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// The server's JSON error body, if the failure carried one.
    ///
    /// `None` means either the server could not be reached or it replied
    /// without a JSON body.
    pub fn response(&self) -> Option<&Value> {
        match self {
            Self::ApiError { response, .. } => Some(response),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ApiError { status, .. } | Self::HttpError { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the request with a reason
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::ApiError { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::HttpError {
                status: status.as_u16(),
            },
            None => Self::NetworkError(e.to_string()),
        }
    }
}

/// Decode a failed response body into a [`ClientError`].
///
/// A body that parses as JSON becomes [`ClientError::ApiError`]; an empty or
/// non-JSON body becomes [`ClientError::HttpError`].
pub fn decode_error_response(status: StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<Value>(body) {
        Ok(response) => ClientError::ApiError {
            status: status.as_u16(),
            message: error_message(status, &response),
            response,
        },
        Err(_) => ClientError::HttpError {
            status: status.as_u16(),
        },
    }
}

fn error_message(status: StatusCode, response: &Value) -> String {
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| response.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request rejected")
                .to_string()
        })
}
