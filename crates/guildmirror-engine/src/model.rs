//! Snapshot model of a guild as seen through the directory service.
//!
//! A [`Workspace`] is a point-in-time copy. The engine reads the source
//! snapshot, issues mutations against the target through the directory, and
//! never writes back into either snapshot.

use crate::id::{ChannelId, EmojiId, GuildId, RoleId, UserId};
use crate::permissions::Permissions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A fetchable asset (icon, banner or emoji image).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    /// Absolute URL of the image.
    pub url: String,
}

impl AssetRef {
    /// Create an asset reference from a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role identity.
    pub id: RoleId,
    /// Display name.
    pub name: String,
    /// Guild-wide permissions granted by the role.
    pub permissions: Permissions,
    /// RGB display color, 0 for none.
    pub color: u32,
    /// Shown separately in the member list.
    pub hoist: bool,
    /// Can be mentioned by anyone.
    pub mentionable: bool,
    /// Hierarchy position, higher is more senior.
    pub position: i64,
    /// Owned by an integration (bot or boost role).
    #[serde(default)]
    pub managed: bool,
}

impl Role {
    /// A plain role with no permissions or decoration.
    pub fn new(id: RoleId, name: impl Into<String>, position: i64) -> Self {
        Self {
            id,
            name: name.into(),
            permissions: Permissions::empty(),
            color: 0,
            hoist: false,
            mentionable: false,
            position,
            managed: false,
        }
    }
}

/// The subject a permission overwrite applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum OverwriteSubject {
    /// The guild's default role, whatever its id is in a given guild.
    DefaultRole,
    /// A specific role.
    Role(RoleId),
    /// A specific member.
    Member(UserId),
}

/// Per-subject allow/deny bits on a category or channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverwrite {
    /// Who the overwrite applies to.
    pub subject: OverwriteSubject,
    /// Explicitly granted bits.
    pub allow: Permissions,
    /// Explicitly denied bits.
    pub deny: Permissions,
}

impl PermissionOverwrite {
    /// Create an overwrite.
    pub fn new(subject: OverwriteSubject, allow: Permissions, deny: Permissions) -> Self {
        Self {
            subject,
            allow,
            deny,
        }
    }
}

/// A channel category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category identity.
    pub id: ChannelId,
    /// Display name.
    pub name: String,
    /// Sort position among categories.
    pub position: i64,
    /// Permission overwrites inherited by synced children.
    #[serde(default)]
    pub overwrites: Vec<PermissionOverwrite>,
}

impl Category {
    /// A category without overwrites.
    pub fn new(id: ChannelId, name: impl Into<String>, position: i64) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            overwrites: Vec::new(),
        }
    }
}

/// Kind-specific channel attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelKind {
    /// Text channel.
    Text {
        /// Channel topic.
        topic: Option<String>,
        /// Slow-mode interval in seconds, 0 when off.
        slowmode_secs: u32,
        /// Age-restricted flag.
        nsfw: bool,
    },
    /// Voice channel.
    Voice {
        /// Audio bitrate in bits per second.
        bitrate: u32,
        /// Maximum connected users, 0 for unlimited.
        user_limit: u32,
    },
    /// Stage channel.
    Stage {
        /// Stage topic, when set.
        topic: Option<String>,
    },
    /// A channel type that is not replicated (forum, media, directory).
    /// Kept so teardown still removes it from the target.
    Other {
        /// Raw service type code.
        type_code: u8,
    },
}

impl ChannelKind {
    /// Short human-readable kind name used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Text { .. } => "text",
            ChannelKind::Voice { .. } => "voice",
            ChannelKind::Stage { .. } => "stage",
            ChannelKind::Other { .. } => "other",
        }
    }

    /// Whether the replicator can recreate this kind.
    pub fn is_replicable(&self) -> bool {
        !matches!(self, ChannelKind::Other { .. })
    }
}

/// A non-category channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Channel identity.
    pub id: ChannelId,
    /// Display name.
    pub name: String,
    /// Sort position.
    pub position: i64,
    /// Parent category, if any.
    pub parent: Option<ChannelId>,
    /// Permission overwrites.
    #[serde(default)]
    pub overwrites: Vec<PermissionOverwrite>,
    /// Kind and kind-specific attributes.
    pub kind: ChannelKind,
}

impl Channel {
    /// A text channel with default attributes.
    pub fn text(id: ChannelId, name: impl Into<String>, position: i64) -> Self {
        Self::with_kind(
            id,
            name,
            position,
            ChannelKind::Text {
                topic: None,
                slowmode_secs: 0,
                nsfw: false,
            },
        )
    }

    /// A voice channel with the service's default bitrate.
    pub fn voice(id: ChannelId, name: impl Into<String>, position: i64) -> Self {
        Self::with_kind(
            id,
            name,
            position,
            ChannelKind::Voice {
                bitrate: 64_000,
                user_limit: 0,
            },
        )
    }

    /// A stage channel without a topic.
    pub fn stage(id: ChannelId, name: impl Into<String>, position: i64) -> Self {
        Self::with_kind(id, name, position, ChannelKind::Stage { topic: None })
    }

    /// A channel of an explicit kind.
    pub fn with_kind(
        id: ChannelId,
        name: impl Into<String>,
        position: i64,
        kind: ChannelKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            parent: None,
            overwrites: Vec::new(),
            kind,
        }
    }

    /// Place the channel under a category.
    pub fn in_category(mut self, parent: ChannelId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Attach an overwrite.
    pub fn with_overwrite(mut self, overwrite: PermissionOverwrite) -> Self {
        self.overwrites.push(overwrite);
        self
    }
}

/// A custom emoji.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    /// Emoji identity.
    pub id: EmojiId,
    /// Emoji name.
    pub name: String,
    /// Animated (GIF) emoji.
    #[serde(default)]
    pub animated: bool,
    /// Where the image can be downloaded.
    pub asset: AssetRef,
}

/// A guild member, as far as the admin check needs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Member's user id.
    pub user_id: UserId,
    /// Roles held, excluding the default role.
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

/// The listing entry for a guild the session can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    /// Guild identity.
    pub id: GuildId,
    /// Guild name.
    pub name: String,
    /// Guild icon, when set.
    pub icon: Option<AssetRef>,
    /// Guild banner, when set.
    pub banner: Option<AssetRef>,
}

/// A full snapshot of one guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    /// Guild identity.
    pub id: GuildId,
    /// Guild name.
    pub name: String,
    /// Guild owner, when known.
    pub owner_id: Option<UserId>,
    /// Icon asset.
    pub icon: Option<AssetRef>,
    /// Banner asset.
    pub banner: Option<AssetRef>,
    /// Id of the implicit default role.
    pub default_role: RoleId,
    /// All roles, the default role included.
    pub roles: Vec<Role>,
    /// Categories.
    pub categories: Vec<Category>,
    /// Non-category channels.
    pub channels: Vec<Channel>,
    /// Custom emoji in service order.
    pub emojis: Vec<Emoji>,
    /// Ids of current members (may be empty if the service will not list them).
    #[serde(default)]
    pub members: HashSet<UserId>,
}

impl Workspace {
    /// An empty guild whose default role shares the guild id.
    pub fn new(id: GuildId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            owner_id: None,
            icon: None,
            banner: None,
            default_role: id.default_role(),
            roles: vec![Role::new(id.default_role(), "@everyone", 0)],
            categories: Vec::new(),
            channels: Vec::new(),
            emojis: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// The listing entry describing this snapshot.
    pub fn summary(&self) -> WorkspaceSummary {
        WorkspaceSummary {
            id: self.id,
            name: self.name.clone(),
            icon: self.icon.clone(),
            banner: self.banner.clone(),
        }
    }

    /// Roles eligible for replication and teardown: everything but the default role.
    pub fn replicable_roles(&self) -> impl Iterator<Item = &Role> {
        let default_role = self.default_role;
        self.roles.iter().filter(move |r| r.id != default_role)
    }

    /// Look up a role by id.
    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// Look up a category by id.
    pub fn category(&self, id: ChannelId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Returns true if the user is a current member.
    pub fn has_member(&self, user: UserId) -> bool {
        self.members.contains(&user)
    }

    /// Effective guild-level permissions of a member.
    ///
    /// The owner holds everything; everyone else gets the default role's bits
    /// plus the bits of every role they hold.
    pub fn member_permissions(&self, member: &Member) -> Permissions {
        if self.owner_id == Some(member.user_id) {
            return Permissions::all();
        }
        let mut perms = self
            .role(self.default_role)
            .map(|r| r.permissions)
            .unwrap_or_default();
        for role_id in &member.roles {
            if let Some(role) = self.role(*role_id) {
                perms |= role.permissions;
            }
        }
        if perms.contains(Permissions::ADMINISTRATOR) {
            return Permissions::all();
        }
        perms
    }
}
