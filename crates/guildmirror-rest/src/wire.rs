//! JSON payloads of the REST API and their conversion to and from the engine model.

use std::collections::HashSet;

use guildmirror_engine::model::{
    Category, Channel, ChannelKind, Emoji, Member, OverwriteSubject, PermissionOverwrite, Role,
    Workspace, WorkspaceSummary,
};
use guildmirror_engine::{ChannelId, EmojiId, GuildId, Permissions, RoleId, UserId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cdn::Cdn;

/// Channel type codes.
pub mod channel_type {
    /// Text channel.
    pub const TEXT: u8 = 0;
    /// Voice channel.
    pub const VOICE: u8 = 2;
    /// Category.
    pub const CATEGORY: u8 = 4;
    /// Announcement channel; replicated as text.
    pub const ANNOUNCEMENT: u8 = 5;
    /// Stage channel.
    pub const STAGE: u8 = 13;
}

const OVERWRITE_ROLE: u8 = 0;
const OVERWRITE_MEMBER: u8 = 1;

/// Snowflakes travel as strings; some older payloads use bare numbers.
mod snowflake {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        struct SnowflakeVisitor;

        impl<'de> Visitor<'de> for SnowflakeVisitor {
            type Value = u64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a string or integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}

/// `GET /users/@me`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    /// User id.
    pub id: UserId,
    /// Account name.
    #[serde(default)]
    pub username: String,
}

/// A role object.
#[derive(Debug, Clone, Deserialize)]
pub struct WireRole {
    /// Role id.
    pub id: RoleId,
    /// Name.
    pub name: String,
    /// Permission bits as a decimal string.
    pub permissions: Permissions,
    /// RGB color.
    #[serde(default)]
    pub color: u32,
    /// Hoisted.
    #[serde(default)]
    pub hoist: bool,
    /// Mentionable.
    #[serde(default)]
    pub mentionable: bool,
    /// Hierarchy position.
    #[serde(default)]
    pub position: i64,
    /// Integration-managed.
    #[serde(default)]
    pub managed: bool,
}

impl From<WireRole> for Role {
    fn from(w: WireRole) -> Self {
        Role {
            id: w.id,
            name: w.name,
            permissions: w.permissions,
            color: w.color,
            hoist: w.hoist,
            mentionable: w.mentionable,
            position: w.position,
            managed: w.managed,
        }
    }
}

/// An emoji object. Unicode emoji carry no id and are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct WireEmoji {
    /// Emoji id.
    pub id: Option<EmojiId>,
    /// Name.
    pub name: Option<String>,
    /// Animated.
    #[serde(default)]
    pub animated: bool,
}

impl WireEmoji {
    /// Convert a custom emoji; `None` for anything without an id or name.
    pub fn into_model(self, cdn: &Cdn) -> Option<Emoji> {
        let id = self.id?;
        let name = self.name?;
        Some(Emoji {
            id,
            name,
            animated: self.animated,
            asset: cdn.emoji(id, self.animated),
        })
    }
}

/// `GET /guilds/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireGuild {
    /// Guild id.
    pub id: GuildId,
    /// Name.
    pub name: String,
    /// Icon hash.
    #[serde(default)]
    pub icon: Option<String>,
    /// Banner hash.
    #[serde(default)]
    pub banner: Option<String>,
    /// Owner.
    #[serde(default)]
    pub owner_id: Option<UserId>,
    /// Roles, default role included.
    #[serde(default)]
    pub roles: Vec<WireRole>,
    /// Custom emoji.
    #[serde(default)]
    pub emojis: Vec<WireEmoji>,
}

/// An entry of `GET /users/@me/guilds`.
#[derive(Debug, Clone, Deserialize)]
pub struct WirePartialGuild {
    /// Guild id.
    pub id: GuildId,
    /// Name.
    pub name: String,
    /// Icon hash.
    #[serde(default)]
    pub icon: Option<String>,
    /// Banner hash.
    #[serde(default)]
    pub banner: Option<String>,
}

impl WirePartialGuild {
    /// Convert into a listing entry.
    pub fn into_summary(self, cdn: &Cdn) -> WorkspaceSummary {
        WorkspaceSummary {
            id: self.id,
            icon: self.icon.as_deref().map(|h| cdn.guild_icon(self.id, h)),
            banner: self.banner.as_deref().map(|h| cdn.guild_banner(self.id, h)),
            name: self.name,
        }
    }
}

/// A permission overwrite as the API sends and accepts it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOverwrite {
    /// Role or user id, depending on `kind`.
    #[serde(with = "snowflake")]
    pub id: u64,
    /// 0 for a role, 1 for a member.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Allowed bits.
    pub allow: Permissions,
    /// Denied bits.
    pub deny: Permissions,
}

impl WireOverwrite {
    /// Convert into the model. A role overwrite naming the guild id targets
    /// the default role.
    pub fn into_model(self, guild: GuildId) -> Option<PermissionOverwrite> {
        let subject = match self.kind {
            OVERWRITE_ROLE if self.id == guild.get() => OverwriteSubject::DefaultRole,
            OVERWRITE_ROLE => OverwriteSubject::Role(RoleId(self.id)),
            OVERWRITE_MEMBER => OverwriteSubject::Member(UserId(self.id)),
            other => {
                debug!(kind = other, id = self.id, "ignoring overwrite of unknown type");
                return None;
            }
        };
        Some(PermissionOverwrite::new(subject, self.allow, self.deny))
    }

    /// Build the outbound form for `guild`.
    pub fn from_model(overwrite: &PermissionOverwrite, guild: GuildId) -> Self {
        let (id, kind) = match overwrite.subject {
            OverwriteSubject::DefaultRole => (guild.get(), OVERWRITE_ROLE),
            OverwriteSubject::Role(role) => (role.get(), OVERWRITE_ROLE),
            OverwriteSubject::Member(user) => (user.get(), OVERWRITE_MEMBER),
        };
        Self {
            id,
            kind,
            allow: overwrite.allow,
            deny: overwrite.deny,
        }
    }
}

/// A channel object of any type.
#[derive(Debug, Clone, Deserialize)]
pub struct WireChannel {
    /// Channel id.
    pub id: ChannelId,
    /// Type code, see [`channel_type`].
    #[serde(rename = "type")]
    pub kind: u8,
    /// Name.
    #[serde(default)]
    pub name: String,
    /// Sort position.
    #[serde(default)]
    pub position: i64,
    /// Parent category.
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
    /// Overwrites.
    #[serde(default)]
    pub permission_overwrites: Vec<WireOverwrite>,
    /// Topic (text and stage).
    #[serde(default)]
    pub topic: Option<String>,
    /// Slow-mode seconds.
    #[serde(default)]
    pub rate_limit_per_user: Option<u32>,
    /// Age-restricted.
    #[serde(default)]
    pub nsfw: bool,
    /// Voice bitrate.
    #[serde(default)]
    pub bitrate: Option<u32>,
    /// Voice user limit.
    #[serde(default)]
    pub user_limit: Option<u32>,
}

/// Split a channel listing into categories and channels.
///
/// Channel types the engine does not replicate (forum, media, directory)
/// come back as [`ChannelKind::Other`] so teardown can still remove them.
pub fn split_channels(guild: GuildId, channels: Vec<WireChannel>) -> (Vec<Category>, Vec<Channel>) {
    let mut categories = Vec::new();
    let mut out = Vec::new();
    for ch in channels {
        let overwrites: Vec<PermissionOverwrite> = ch
            .permission_overwrites
            .into_iter()
            .filter_map(|ow| ow.into_model(guild))
            .collect();
        let kind = match ch.kind {
            channel_type::CATEGORY => {
                categories.push(Category {
                    id: ch.id,
                    name: ch.name,
                    position: ch.position,
                    overwrites,
                });
                continue;
            }
            channel_type::TEXT | channel_type::ANNOUNCEMENT => ChannelKind::Text {
                topic: ch.topic,
                slowmode_secs: ch.rate_limit_per_user.unwrap_or(0),
                nsfw: ch.nsfw,
            },
            channel_type::VOICE => ChannelKind::Voice {
                bitrate: ch.bitrate.unwrap_or(64_000),
                user_limit: ch.user_limit.unwrap_or(0),
            },
            channel_type::STAGE => ChannelKind::Stage { topic: ch.topic },
            other => {
                debug!(channel = %ch.name, kind = other, "channel type is not replicated");
                ChannelKind::Other { type_code: other }
            }
        };
        out.push(Channel {
            id: ch.id,
            name: ch.name,
            position: ch.position,
            parent: ch.parent_id,
            overwrites,
            kind,
        });
    }
    (categories, out)
}

/// A guild member object.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMember {
    /// The member's user.
    pub user: WireUser,
    /// Held roles.
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl From<WireMember> for Member {
    fn from(w: WireMember) -> Self {
        Member {
            user_id: w.user.id,
            roles: w.roles,
        }
    }
}

/// Everything a snapshot is assembled from.
#[derive(Debug)]
pub struct WorkspaceParts {
    /// Guild header.
    pub id: GuildId,
    /// Name.
    pub name: String,
    /// Owner.
    pub owner_id: Option<UserId>,
    /// Icon hash.
    pub icon: Option<String>,
    /// Banner hash.
    pub banner: Option<String>,
    /// Roles.
    pub roles: Vec<WireRole>,
    /// Emoji.
    pub emojis: Vec<WireEmoji>,
    /// Channels of every type.
    pub channels: Vec<WireChannel>,
    /// Member ids.
    pub members: HashSet<UserId>,
}

impl WorkspaceParts {
    /// Assemble the snapshot.
    pub fn assemble(self, cdn: &Cdn) -> Workspace {
        let id = self.id;
        let (categories, channels) = split_channels(id, self.channels);
        Workspace {
            id,
            name: self.name,
            owner_id: self.owner_id,
            icon: self.icon.as_deref().map(|h| cdn.guild_icon(id, h)),
            banner: self.banner.as_deref().map(|h| cdn.guild_banner(id, h)),
            default_role: id.default_role(),
            roles: self.roles.into_iter().map(Role::from).collect(),
            categories,
            channels,
            emojis: self
                .emojis
                .into_iter()
                .filter_map(|e| e.into_model(cdn))
                .collect(),
            members: self.members,
        }
    }
}

/// `POST /guilds/{id}/roles`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateRoleBody<'a> {
    /// Name.
    pub name: &'a str,
    /// Permission bits.
    pub permissions: Permissions,
    /// RGB color.
    pub color: u32,
    /// Hoisted.
    pub hoist: bool,
    /// Mentionable.
    pub mentionable: bool,
}

/// One entry of `PATCH /guilds/{id}/roles`.
#[derive(Debug, Clone, Serialize)]
pub struct RolePositionBody {
    /// Role id.
    pub id: RoleId,
    /// New position.
    pub position: i64,
}

/// `POST /guilds/{id}/channels`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateChannelBody {
    /// Name.
    pub name: String,
    /// Type code.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Slow-mode seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit_per_user: Option<u32>,
    /// Age-restricted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nsfw: Option<bool>,
    /// Voice bitrate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    /// Voice user limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_limit: Option<u32>,
    /// Parent category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ChannelId>,
    /// Overwrites.
    pub permission_overwrites: Vec<WireOverwrite>,
}

/// `POST /guilds/{id}/emojis`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEmojiBody<'a> {
    /// Name.
    pub name: &'a str,
    /// Image as a data URI.
    pub image: String,
    /// Roles allowed to use the emoji; empty for everyone.
    pub roles: Vec<RoleId>,
}

/// `PATCH /guilds/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditGuildBody {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New icon as a data URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// New banner as a data URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

/// Any created object; only the id is read back.
#[derive(Debug, Clone, Deserialize)]
pub struct Created<T> {
    /// New id.
    pub id: T,
}
