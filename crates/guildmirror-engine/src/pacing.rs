//! Request pacing and cancellation.
//!
//! The engine never issues two mutating calls back to back: each one is
//! followed by a fixed delay chosen by the kind of operation. Those delays are
//! also the only places a run can be cancelled, so a cancelled run always
//! stops between two complete operations.

use crate::error::Cancelled;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// The kind of operation a pause follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaceKind {
    /// After creating a role.
    RoleCreate,
    /// After creating a category or channel.
    ChannelCreate,
    /// After uploading an emoji.
    EmojiCreate,
    /// After a permission-level edit (role reorder, guild settings).
    PermissionUpdate,
    /// After deleting a channel, category or role.
    Delete,
    /// After deleting an emoji.
    EmojiDelete,
}

/// Delay per operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// Delay after each role creation.
    pub role_create: Duration,
    /// Delay after each category or channel creation.
    pub channel_create: Duration,
    /// Delay after each emoji upload.
    pub emoji_create: Duration,
    /// Delay after permission-level edits.
    pub permission_update: Duration,
    /// Delay after each channel, category or role deletion.
    pub delete: Duration,
    /// Delay after each emoji deletion.
    pub emoji_delete: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            role_create: Duration::from_millis(1000),
            channel_create: Duration::from_millis(500),
            emoji_create: Duration::from_millis(1000),
            permission_update: Duration::from_millis(300),
            delete: Duration::from_millis(300),
            emoji_delete: Duration::from_millis(200),
        }
    }
}

impl PacingConfig {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            role_create: Duration::ZERO,
            channel_create: Duration::ZERO,
            emoji_create: Duration::ZERO,
            permission_update: Duration::ZERO,
            delete: Duration::ZERO,
            emoji_delete: Duration::ZERO,
        }
    }

    /// The delay configured for an operation kind.
    pub fn delay(&self, kind: PaceKind) -> Duration {
        match kind {
            PaceKind::RoleCreate => self.role_create,
            PaceKind::ChannelCreate => self.channel_create,
            PaceKind::EmojiCreate => self.emoji_create,
            PaceKind::PermissionUpdate => self.permission_update,
            PaceKind::Delete => self.delete,
            PaceKind::EmojiDelete => self.emoji_delete,
        }
    }
}

/// Applies pacing delays and observes the run's cancellation token.
#[derive(Debug, Clone)]
pub struct Pacer {
    config: PacingConfig,
    cancel: CancellationToken,
}

impl Pacer {
    /// Create a pacer.
    pub fn new(config: PacingConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    /// A pacer with no delays and a token nobody else holds.
    pub fn unpaced() -> Self {
        Self::new(PacingConfig::none(), CancellationToken::new())
    }

    /// The active configuration.
    pub fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Returns true once the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wait out the delay for `kind`, or return early if the run is cancelled.
    pub async fn pause(&self, kind: PaceKind) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            return Err(Cancelled);
        }
        let delay = self.config.delay(kind);
        if delay.is_zero() {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        }
    }
}
