//! [`Directory`] implementation over the REST API.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use guildmirror_engine::directory::{
    self, NewCategory, NewRole, NewStageChannel, NewTextChannel, NewVoiceChannel, RolePosition,
    WorkspaceEdit,
};
use guildmirror_engine::model::{AssetRef, Member, Workspace, WorkspaceSummary};
use guildmirror_engine::{
    ChannelId, Directory, DirectoryError, EmojiId, GuildId, RoleId, UserId,
};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cdn::{Cdn, DEFAULT_CDN_BASE};
use crate::error::{RestError, Result};
use crate::image::data_uri;
use crate::wire::{
    channel_type, CreateChannelBody, CreateEmojiBody, CreateRoleBody, Created, EditGuildBody,
    RolePositionBody, WireChannel, WireEmoji, WireGuild, WireMember, WireOverwrite,
    WirePartialGuild, WireRole, WireUser, WorkspaceParts,
};

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Header carrying the audit-log reason on mutations.
pub const AUDIT_LOG_REASON: &str = "X-Audit-Log-Reason";

const MEMBER_PAGE: usize = 1000;

/// How the token is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Application bot token, sent as `Bot <token>`.
    #[default]
    Bot,
    /// Account token, sent as is.
    User,
}

impl TokenKind {
    /// The header value for a token of this kind.
    pub fn authorization(self, token: &str) -> String {
        match self {
            TokenKind::Bot => format!("Bot {token}"),
            TokenKind::User => token.to_string(),
        }
    }
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// API base URL.
    pub api_base: String,
    /// Media CDN base URL.
    pub cdn_base: String,
    /// Access token.
    pub token: String,
    /// How the token is sent.
    pub token_kind: TokenKind,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User-Agent header.
    pub user_agent: String,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cdn_base: DEFAULT_CDN_BASE.to_string(),
            token: String::new(),
            token_kind: TokenKind::Bot,
            timeout: Duration::from_secs(30),
            user_agent: format!(
                "DiscordBot (https://github.com/guildmirror/guildmirror, {})",
                env!("CARGO_PKG_VERSION")
            ),
        }
    }
}

impl RestConfig {
    /// Default settings with the given token.
    pub fn with_token(token: impl Into<String>, token_kind: TokenKind) -> Self {
        Self {
            token: token.into(),
            token_kind,
            ..Default::default()
        }
    }
}

/// REST-backed directory.
#[derive(Debug, Clone)]
pub struct RestDirectory {
    http: Client,
    api_base: String,
    auth: HeaderValue,
    cdn: Cdn,
}

impl RestDirectory {
    /// Build a client.
    pub fn new(config: RestConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&config.token_kind.authorization(&config.token))
            .map_err(|_| RestError::InvalidToken)?;
        auth.set_sensitive(true);
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            auth,
            cdn: Cdn::new(config.cdn_base),
        })
    }

    fn request(&self, method: Method, path: &str, reason: Option<&str>) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{path}", self.api_base))
            .header(AUTHORIZATION, self.auth.clone());
        if let Some(reason) = reason.and_then(|r| HeaderValue::from_str(r).ok()) {
            builder = builder.header(AUDIT_LOG_REASON, reason);
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<String> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(path, status = status.as_u16(), "api response");
        if !status.is_success() {
            return Err(RestError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.send(self.request(Method::GET, path, None), path).await?;
        decode(path, &body)
    }

    async fn write<B, T>(&self, method: Method, path: &str, body: &B, reason: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path, Some(reason)).json(body);
        let text = self.send(builder, path).await?;
        decode(path, &text)
    }

    async fn delete(&self, path: &str, reason: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, path, Some(reason)), path)
            .await
            .map(|_| ())
    }

    /// Member ids of a guild. Listing members needs a privileged intent, so a
    /// refusal yields an empty set.
    async fn member_ids(&self, guild: GuildId) -> HashSet<UserId> {
        let mut ids = HashSet::new();
        let mut after = 0u64;
        loop {
            let path = format!("/guilds/{guild}/members?limit={MEMBER_PAGE}&after={after}");
            let page: Vec<WireMember> = match self.get(&path).await {
                Ok(page) => page,
                Err(err) => {
                    warn!(guild = %guild, "cannot list members, member overwrites will be dropped: {err}");
                    return ids;
                }
            };
            let count = page.len();
            for member in page {
                after = after.max(member.user.id.get());
                ids.insert(member.user.id);
            }
            if count < MEMBER_PAGE {
                return ids;
            }
        }
    }

    async fn channels(&self, guild: GuildId) -> Result<Vec<WireChannel>> {
        self.get(&format!("/guilds/{guild}/channels")).await
    }

    async fn create_channel(&self, guild: GuildId, body: &CreateChannelBody, reason: &str) -> Result<ChannelId> {
        let created: Created<ChannelId> = self
            .write(Method::POST, &format!("/guilds/{guild}/channels"), body, reason)
            .await?;
        Ok(created.id)
    }

    async fn fetch_full(&self, id: GuildId) -> Result<Workspace> {
        let guild: WireGuild = self.get(&format!("/guilds/{id}")).await?;
        let channels = self.channels(id).await?;
        let members = self.member_ids(id).await;
        Ok(WorkspaceParts {
            id: guild.id,
            name: guild.name,
            owner_id: guild.owner_id,
            icon: guild.icon,
            banner: guild.banner,
            roles: guild.roles,
            emojis: guild.emojis,
            channels,
            members,
        }
        .assemble(&self.cdn))
    }

    async fn fetch_listed(&self, summary: &WorkspaceSummary) -> Result<Workspace> {
        let id = summary.id;
        let roles: Vec<WireRole> = self.get(&format!("/guilds/{id}/roles")).await?;
        let channels = self.channels(id).await?;
        let emojis: Vec<WireEmoji> = match self.get(&format!("/guilds/{id}/emojis")).await {
            Ok(emojis) => emojis,
            Err(err) => {
                warn!(guild = %id, "cannot list emoji: {err}");
                Vec::new()
            }
        };
        let members = self.member_ids(id).await;
        let mut workspace = WorkspaceParts {
            id,
            name: summary.name.clone(),
            owner_id: None,
            icon: None,
            banner: None,
            roles,
            emojis,
            channels,
            members,
        }
        .assemble(&self.cdn);
        workspace.icon = summary.icon.clone();
        workspace.banner = summary.banner.clone();
        Ok(workspace)
    }

    async fn download(&self, asset: &AssetRef) -> std::result::Result<Bytes, DirectoryError> {
        let response = self
            .http
            .get(&asset.url)
            .send()
            .await
            .map_err(RestError::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::AssetStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await.map_err(RestError::from)?)
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| RestError::Decode {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

fn outbound_overwrites(
    overwrites: &[guildmirror_engine::model::PermissionOverwrite],
    guild: GuildId,
) -> Vec<WireOverwrite> {
    overwrites
        .iter()
        .map(|ow| WireOverwrite::from_model(ow, guild))
        .collect()
}

#[async_trait]
impl Directory for RestDirectory {
    async fn current_user(&self) -> directory::Result<UserId> {
        let user: WireUser = self.get("/users/@me").await?;
        debug!(user = %user.id, name = %user.username, "authenticated");
        Ok(user.id)
    }

    async fn fetch_workspace(&self, id: GuildId) -> directory::Result<Workspace> {
        Ok(self.fetch_full(id).await?)
    }

    async fn accessible_workspaces(&self) -> directory::Result<Vec<WorkspaceSummary>> {
        let guilds: Vec<WirePartialGuild> = self.get("/users/@me/guilds").await?;
        Ok(guilds
            .into_iter()
            .map(|g| g.into_summary(&self.cdn))
            .collect())
    }

    async fn fetch_workspace_from_listing(&self, summary: &WorkspaceSummary) -> directory::Result<Workspace> {
        Ok(self.fetch_listed(summary).await?)
    }

    async fn fetch_member(&self, guild: GuildId, user: UserId) -> directory::Result<Member> {
        let member: WireMember = self.get(&format!("/guilds/{guild}/members/{user}")).await?;
        Ok(member.into())
    }

    async fn edit_workspace(&self, guild: GuildId, edit: &WorkspaceEdit, reason: &str) -> directory::Result<()> {
        let body = EditGuildBody {
            name: edit.name.clone(),
            icon: edit.icon.as_deref().map(data_uri).transpose()?,
            banner: edit.banner.as_deref().map(data_uri).transpose()?,
        };
        let _: serde_json::Value = self
            .write(Method::PATCH, &format!("/guilds/{guild}"), &body, reason)
            .await?;
        Ok(())
    }

    async fn create_role(&self, guild: GuildId, role: &NewRole, reason: &str) -> directory::Result<RoleId> {
        let body = CreateRoleBody {
            name: &role.name,
            permissions: role.permissions,
            color: role.color,
            hoist: role.hoist,
            mentionable: role.mentionable,
        };
        let created: Created<RoleId> = self
            .write(Method::POST, &format!("/guilds/{guild}/roles"), &body, reason)
            .await?;
        Ok(created.id)
    }

    async fn delete_role(&self, guild: GuildId, role: RoleId, reason: &str) -> directory::Result<()> {
        Ok(self.delete(&format!("/guilds/{guild}/roles/{role}"), reason).await?)
    }

    async fn edit_role_positions(
        &self,
        guild: GuildId,
        positions: &[RolePosition],
        reason: &str,
    ) -> directory::Result<()> {
        let body: Vec<RolePositionBody> = positions
            .iter()
            .map(|p| RolePositionBody {
                id: p.id,
                position: p.position,
            })
            .collect();
        let _: serde_json::Value = self
            .write(Method::PATCH, &format!("/guilds/{guild}/roles"), &body, reason)
            .await?;
        Ok(())
    }

    async fn create_category(
        &self,
        guild: GuildId,
        category: &NewCategory,
        reason: &str,
    ) -> directory::Result<ChannelId> {
        let body = CreateChannelBody {
            name: category.name.clone(),
            kind: channel_type::CATEGORY,
            permission_overwrites: outbound_overwrites(&category.overwrites, guild),
            ..Default::default()
        };
        Ok(self.create_channel(guild, &body, reason).await?)
    }

    async fn delete_category(&self, _guild: GuildId, category: ChannelId, reason: &str) -> directory::Result<()> {
        Ok(self.delete(&format!("/channels/{category}"), reason).await?)
    }

    async fn create_text_channel(
        &self,
        guild: GuildId,
        channel: &NewTextChannel,
        reason: &str,
    ) -> directory::Result<ChannelId> {
        let body = CreateChannelBody {
            name: channel.name.clone(),
            kind: channel_type::TEXT,
            topic: channel.topic.clone(),
            rate_limit_per_user: Some(channel.slowmode_secs),
            nsfw: Some(channel.nsfw),
            parent_id: channel.parent,
            permission_overwrites: outbound_overwrites(&channel.overwrites, guild),
            ..Default::default()
        };
        Ok(self.create_channel(guild, &body, reason).await?)
    }

    async fn create_voice_channel(
        &self,
        guild: GuildId,
        channel: &NewVoiceChannel,
        reason: &str,
    ) -> directory::Result<ChannelId> {
        let body = CreateChannelBody {
            name: channel.name.clone(),
            kind: channel_type::VOICE,
            bitrate: Some(channel.bitrate),
            user_limit: Some(channel.user_limit),
            parent_id: channel.parent,
            permission_overwrites: outbound_overwrites(&channel.overwrites, guild),
            ..Default::default()
        };
        Ok(self.create_channel(guild, &body, reason).await?)
    }

    async fn create_stage_channel(
        &self,
        guild: GuildId,
        channel: &NewStageChannel,
        reason: &str,
    ) -> directory::Result<ChannelId> {
        let body = CreateChannelBody {
            name: channel.name.clone(),
            kind: channel_type::STAGE,
            topic: channel.topic.clone(),
            parent_id: channel.parent,
            permission_overwrites: outbound_overwrites(&channel.overwrites, guild),
            ..Default::default()
        };
        Ok(self.create_channel(guild, &body, reason).await?)
    }

    async fn delete_channel(&self, _guild: GuildId, channel: ChannelId, reason: &str) -> directory::Result<()> {
        Ok(self.delete(&format!("/channels/{channel}"), reason).await?)
    }

    async fn create_emoji(
        &self,
        guild: GuildId,
        name: &str,
        image: &[u8],
        reason: &str,
    ) -> directory::Result<EmojiId> {
        let body = CreateEmojiBody {
            name,
            image: data_uri(image)?,
            roles: Vec::new(),
        };
        let created: Created<EmojiId> = self
            .write(Method::POST, &format!("/guilds/{guild}/emojis"), &body, reason)
            .await?;
        Ok(created.id)
    }

    async fn delete_emoji(&self, guild: GuildId, emoji: EmojiId, reason: &str) -> directory::Result<()> {
        Ok(self.delete(&format!("/guilds/{guild}/emojis/{emoji}"), reason).await?)
    }

    async fn fetch_asset(&self, asset: &AssetRef) -> directory::Result<Bytes> {
        self.download(asset).await
    }
}
