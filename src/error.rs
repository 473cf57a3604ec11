//! Error taxonomy for backend calls
//!
//! Every failed round trip ends up as an [`ApiError`]. Its `Display` text is the
//! message shown to the user, picked by [`Failure::resolve`].

use thiserror::Error;

pub const TIMEOUT_MESSAGE: &str = "Server is not responding or processing is taking too long.";
pub const UNREACHABLE_MESSAGE: &str =
    "Cannot connect to the server. Make sure the backend is running.";
pub const UNKNOWN_MESSAGE: &str = "Unknown error. Check the logs for details.";
pub const NOT_TRAINED_MESSAGE: &str = "Model is not trained yet. Train the model first.";

/// Error surfaced to a panel after a backend call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,

    /// Backend answered with a JSON `detail` string
    #[error("{message}")]
    Detail { status: u16, message: String },

    /// HTTP reason phrase of a non-2xx answer
    #[error("{text}")]
    Status { status: u16, text: String },

    #[error("{}", UNREACHABLE_MESSAGE)]
    Unreachable,

    #[error("{}", UNKNOWN_MESSAGE)]
    Unknown,

    #[error("{}", NOT_TRAINED_MESSAGE)]
    NotTrained,

    /// 2xx answer whose body does not have the expected shape
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// Another call for the same endpoint is still outstanding
    #[error("A request to {0} is already in progress.")]
    Busy(&'static str),

    /// Form input rejected before any request was made
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    /// HTTP status of the answer, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Detail { status, .. } | ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Raw facts about a failed call, before a message is chosen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Failure {
    /// The timeout budget ran out
    pub timed_out: bool,
    /// A TCP connection to the backend was established
    pub connected: bool,
    pub status: Option<u16>,
    /// Reason phrase for `status`
    pub status_text: Option<String>,
    /// `detail` string from the JSON error body
    pub detail: Option<String>,
}

impl Failure {
    pub fn timeout() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Failure for a non-2xx answer with its raw body
    pub fn from_response(status: u16, status_text: Option<&str>, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str().map(|s| s.to_string())));

        Self {
            timed_out: false,
            connected: true,
            status: Some(status),
            status_text: status_text.map(|s| s.to_string()),
            detail,
        }
    }

    /// Pick the user-facing error. First match wins:
    /// timeout, backend detail, status text, unreachable, unknown.
    pub fn resolve(self) -> ApiError {
        if self.timed_out {
            return ApiError::Timeout;
        }

        let status = self.status.unwrap_or(0);

        if let Some(message) = self.detail.filter(|d| !d.is_empty()) {
            return ApiError::Detail { status, message };
        }
        if let Some(text) = self.status_text.filter(|t| !t.is_empty()) {
            return ApiError::Status { status, text };
        }
        if !self.connected || status == 0 {
            return ApiError::Unreachable;
        }
        ApiError::Unknown
    }
}
