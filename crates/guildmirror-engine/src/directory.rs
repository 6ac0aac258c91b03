//! The remote directory service the engine drives.
//!
//! This trait is the only way the engine touches either guild. The REST
//! backend lives in `guildmirror-rest`; `memory::MemoryDirectory`, behind the
//! `testing` feature, is an in-process implementation used by tests.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::DirectoryError;
use crate::id::{ChannelId, EmojiId, GuildId, RoleId, UserId};
use crate::model::{AssetRef, Member, PermissionOverwrite, Role, Workspace, WorkspaceSummary};
use crate::permissions::Permissions;

/// Result type for directory calls.
pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Attributes of a role to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRole {
    /// Display name.
    pub name: String,
    /// Guild-wide permissions.
    pub permissions: Permissions,
    /// RGB color.
    pub color: u32,
    /// Shown separately in the member list.
    pub hoist: bool,
    /// Mentionable by anyone.
    pub mentionable: bool,
}

impl From<&Role> for NewRole {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name.clone(),
            permissions: role.permissions,
            color: role.color,
            hoist: role.hoist,
            mentionable: role.mentionable,
        }
    }
}

/// One entry of a bulk role position assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePosition {
    /// Target role.
    pub id: RoleId,
    /// New position, higher is more senior.
    pub position: i64,
}

/// Attributes of a category to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    /// Display name.
    pub name: String,
    /// Overwrites already expressed in target identities.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Attributes of a text channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTextChannel {
    /// Display name.
    pub name: String,
    /// Topic.
    pub topic: Option<String>,
    /// Slow-mode interval in seconds.
    pub slowmode_secs: u32,
    /// Age-restricted flag.
    pub nsfw: bool,
    /// Target parent category.
    pub parent: Option<ChannelId>,
    /// Overwrites in target identities.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Attributes of a voice channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVoiceChannel {
    /// Display name.
    pub name: String,
    /// Audio bitrate.
    pub bitrate: u32,
    /// Maximum connected users.
    pub user_limit: u32,
    /// Target parent category.
    pub parent: Option<ChannelId>,
    /// Overwrites in target identities.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// Attributes of a stage channel to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStageChannel {
    /// Display name.
    pub name: String,
    /// Stage topic.
    pub topic: Option<String>,
    /// Target parent category.
    pub parent: Option<ChannelId>,
    /// Overwrites in target identities.
    pub overwrites: Vec<PermissionOverwrite>,
}

/// A partial edit of guild-level settings. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceEdit {
    /// New name.
    pub name: Option<String>,
    /// New icon image bytes.
    pub icon: Option<Bytes>,
    /// New banner image bytes.
    pub banner: Option<Bytes>,
}

impl WorkspaceEdit {
    /// An edit that only renames.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// An edit that only replaces the icon.
    pub fn icon(image: Bytes) -> Self {
        Self {
            icon: Some(image),
            ..Default::default()
        }
    }

    /// An edit that only replaces the banner.
    pub fn banner(image: Bytes) -> Self {
        Self {
            banner: Some(image),
            ..Default::default()
        }
    }
}

/// Authenticated access to the remote guild directory.
///
/// Every mutating call takes an audit-log `reason`. Implementations must not
/// retry; the engine treats any error as final for that entity.
#[async_trait]
pub trait Directory: Send + Sync {
    /// The user the session is authenticated as.
    async fn current_user(&self) -> Result<UserId>;

    /// Fetch a full guild snapshot by id.
    ///
    /// Returns [`DirectoryError::NotFound`] or [`DirectoryError::Forbidden`]
    /// when the guild cannot be fetched directly.
    async fn fetch_workspace(&self, id: GuildId) -> Result<Workspace>;

    /// Guilds the session is already a member of.
    async fn accessible_workspaces(&self) -> Result<Vec<WorkspaceSummary>>;

    /// Assemble a snapshot for a guild found through [`Self::accessible_workspaces`].
    async fn fetch_workspace_from_listing(&self, summary: &WorkspaceSummary) -> Result<Workspace>;

    /// Fetch one member of a guild.
    async fn fetch_member(&self, guild: GuildId, user: UserId) -> Result<Member>;

    /// Edit guild-level settings.
    async fn edit_workspace(&self, guild: GuildId, edit: &WorkspaceEdit, reason: &str) -> Result<()>;

    /// Create a role; returns its new id.
    async fn create_role(&self, guild: GuildId, role: &NewRole, reason: &str) -> Result<RoleId>;

    /// Delete a role.
    async fn delete_role(&self, guild: GuildId, role: RoleId, reason: &str) -> Result<()>;

    /// Assign positions to a set of roles in one call.
    async fn edit_role_positions(
        &self,
        guild: GuildId,
        positions: &[RolePosition],
        reason: &str,
    ) -> Result<()>;

    /// Create a category; returns its new id.
    async fn create_category(
        &self,
        guild: GuildId,
        category: &NewCategory,
        reason: &str,
    ) -> Result<ChannelId>;

    /// Delete a category.
    async fn delete_category(&self, guild: GuildId, category: ChannelId, reason: &str) -> Result<()>;

    /// Create a text channel; returns its new id.
    async fn create_text_channel(
        &self,
        guild: GuildId,
        channel: &NewTextChannel,
        reason: &str,
    ) -> Result<ChannelId>;

    /// Create a voice channel; returns its new id.
    async fn create_voice_channel(
        &self,
        guild: GuildId,
        channel: &NewVoiceChannel,
        reason: &str,
    ) -> Result<ChannelId>;

    /// Create a stage channel; returns its new id.
    async fn create_stage_channel(
        &self,
        guild: GuildId,
        channel: &NewStageChannel,
        reason: &str,
    ) -> Result<ChannelId>;

    /// Delete a non-category channel.
    async fn delete_channel(&self, guild: GuildId, channel: ChannelId, reason: &str) -> Result<()>;

    /// Upload a custom emoji; returns its new id.
    async fn create_emoji(
        &self,
        guild: GuildId,
        name: &str,
        image: &[u8],
        reason: &str,
    ) -> Result<EmojiId>;

    /// Delete a custom emoji.
    async fn delete_emoji(&self, guild: GuildId, emoji: EmojiId, reason: &str) -> Result<()>;

    /// Download an asset. A non-success status is [`DirectoryError::AssetStatus`].
    async fn fetch_asset(&self, asset: &AssetRef) -> Result<Bytes>;
}
