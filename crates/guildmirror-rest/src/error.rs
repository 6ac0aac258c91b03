//! REST client errors and their mapping onto directory errors.

use guildmirror_engine::DirectoryError;
use serde::Deserialize;
use thiserror::Error;

/// JSON error code the service returns when a guild has no emoji slots left.
pub const MAX_EMOJIS_CODE: u64 = 30008;

const MAX_EMOJIS_MESSAGE: &str = "Maximum number of emojis reached";

/// Errors raised by the REST client before they are folded into
/// [`DirectoryError`].
#[derive(Debug, Error)]
pub enum RestError {
    /// The token cannot be placed in an HTTP header.
    #[error("token is not a valid header value")]
    InvalidToken,

    /// The HTTP client failed before a response arrived.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status} on {path}")]
    Status {
        /// Request path.
        path: String,
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// A success response could not be decoded.
    #[error("cannot decode response from {path}: {reason}")]
    Decode {
        /// Request path.
        path: String,
        /// Decoder message.
        reason: String,
    },

    /// Image bytes in a format the service will not accept.
    #[error("unsupported image format")]
    UnsupportedImage,
}

/// Result type for REST calls.
pub type Result<T> = std::result::Result<T, RestError>;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<u64>,
    /// Seconds, possibly fractional.
    #[serde(default)]
    retry_after: Option<f64>,
}

/// Map a non-success status and its body onto a directory error.
pub fn classify_status(status: u16, body: &str) -> DirectoryError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let msg = parsed
        .message
        .clone()
        .unwrap_or_else(|| format!("HTTP {status}"));

    if parsed.code == Some(MAX_EMOJIS_CODE) || msg.contains(MAX_EMOJIS_MESSAGE) {
        return DirectoryError::EmojiCapacityExhausted;
    }

    match status {
        401 => DirectoryError::Unauthorized { msg },
        403 => DirectoryError::Forbidden { msg },
        404 => DirectoryError::NotFound { what: msg },
        429 => DirectoryError::RateLimited {
            retry_after_ms: parsed
                .retry_after
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| (s * 1000.0).round() as u64)
                .unwrap_or(0),
        },
        _ => DirectoryError::Service {
            status,
            code: parsed.code,
            msg,
        },
    }
}

impl From<RestError> for DirectoryError {
    fn from(err: RestError) -> Self {
        match err {
            RestError::InvalidToken => DirectoryError::Unauthorized {
                msg: err.to_string(),
            },
            RestError::Http(e) if e.is_decode() => DirectoryError::Unexpected { msg: e.to_string() },
            RestError::Http(e) => DirectoryError::Transport { msg: e.to_string() },
            RestError::Status { status, body, .. } => classify_status(status, &body),
            RestError::Decode { .. } | RestError::UnsupportedImage => DirectoryError::Unexpected {
                msg: err.to_string(),
            },
        }
    }
}
