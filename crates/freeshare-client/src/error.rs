//! Client error types

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend answered with a non-success status
    #[error("{}", describe_status(*status, message.as_deref()))]
    Status {
        status: u16,
        message: Option<String>,
        code: Option<String>,
    },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("This operation requires a signed-in user")]
    NotSignedIn,
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message supplied by the server, if any
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Machine-readable error code supplied by the server, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Build a status error from a raw response body.
    ///
    /// The backend answers either with a JSON object (`message`, `code`, or
    /// the framework default `error`) or with a bare text message.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let body = body.trim();

        let (message, code) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => (parsed.message.or(parsed.error), parsed.code),
            Err(_) if body.is_empty() || body.starts_with('{') || body.starts_with('<') => {
                (None, None)
            }
            Err(_) => (Some(body.to_string()), None),
        };

        ApiError::Status {
            status,
            message: message.filter(|m| !m.trim().is_empty()),
            code: code.filter(|c| !c.trim().is_empty()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        ApiError::InvalidUrl(e.to_string())
    }
}

/// JSON error payload returned by the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn describe_status(status: u16, message: Option<&str>) -> String {
    match message {
        Some(message) => format!("Request failed ({}): {}", status, message),
        None => format!("Request failed ({})", status),
    }
}
