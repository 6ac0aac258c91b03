//! Error types for the replication engine.

use crate::id::GuildId;
use thiserror::Error;

/// Errors reported by a [`Directory`](crate::Directory) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The access token was rejected.
    #[error("authentication rejected: {msg}")]
    Unauthorized {
        /// Message returned by the service.
        msg: String,
    },

    /// The addressed entity does not exist.
    #[error("not found: {what}")]
    NotFound {
        /// What was being looked up.
        what: String,
    },

    /// The session lacks the rights for this operation.
    #[error("missing permissions: {msg}")]
    Forbidden {
        /// Message returned by the service.
        msg: String,
    },

    /// The service throttled the request. Never retried.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited {
        /// Suggested wait in milliseconds.
        retry_after_ms: u64,
    },

    /// The target guild has no free emoji slots left.
    #[error("maximum number of emojis reached")]
    EmojiCapacityExhausted,

    /// An asset download returned a non-success HTTP status.
    #[error("asset download returned HTTP {status}")]
    AssetStatus {
        /// HTTP status code.
        status: u16,
    },

    /// Any other error response from the service.
    #[error("service error {status}: {msg}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Service-specific error code, when present.
        code: Option<u64>,
        /// Message returned by the service.
        msg: String,
    },

    /// The request never produced a response.
    #[error("transport error: {msg}")]
    Transport {
        /// Underlying error description.
        msg: String,
    },

    /// The response could not be understood.
    #[error("unexpected response: {msg}")]
    Unexpected {
        /// Description of what was wrong.
        msg: String,
    },
}

/// Raised at a pacing point when the run's cancellation token has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("clone run cancelled")]
pub struct Cancelled;

/// Run-level errors: the only failures that end a clone run early.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloneError {
    /// The access token is malformed or was rejected.
    #[error("invalid credentials: {msg}")]
    Credential {
        /// Why the credentials were rejected.
        msg: String,
    },

    /// A workspace could not be fetched.
    #[error("cannot resolve guild {guild_id}: {reason}")]
    Resolution {
        /// The guild that failed to resolve.
        guild_id: GuildId,
        /// Why it failed.
        reason: String,
    },

    /// The run was interrupted at a pacing point.
    #[error("clone run cancelled")]
    Cancelled,
}

impl From<Cancelled> for CloneError {
    fn from(_: Cancelled) -> Self {
        CloneError::Cancelled
    }
}
