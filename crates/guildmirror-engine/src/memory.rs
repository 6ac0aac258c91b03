//! In-process [`Directory`] backed by plain snapshots.
//!
//! Mutations are applied to the stored [`Workspace`] values so a test can
//! inspect the resulting guild, and every call is appended to a log. Failures
//! are injected per operation and entity name.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;

use crate::directory::{
    Directory, NewCategory, NewRole, NewStageChannel, NewTextChannel, NewVoiceChannel,
    RolePosition, Result, WorkspaceEdit,
};
use crate::error::DirectoryError;
use crate::id::{ChannelId, EmojiId, GuildId, RoleId, UserId};
use crate::model::{
    AssetRef, Category, Channel, ChannelKind, Emoji, Member, Role, Workspace, WorkspaceSummary,
};

/// Operations a fault can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultOp {
    /// `current_user`; name is ignored.
    CurrentUser,
    /// `fetch_workspace`; name is the guild id.
    FetchWorkspace,
    /// `fetch_member`; name is the user id.
    FetchMember,
    /// `edit_workspace`; name is `rename`, `icon` or `banner`.
    EditWorkspace,
    /// `create_role`; name is the role name.
    CreateRole,
    /// `delete_role`; name is the role name.
    DeleteRole,
    /// `edit_role_positions`; name is ignored.
    EditRolePositions,
    /// `create_category`; name is the category name.
    CreateCategory,
    /// `delete_category`; name is the category name.
    DeleteCategory,
    /// Any channel creation; name is the channel name.
    CreateChannel,
    /// `delete_channel`; name is the channel name.
    DeleteChannel,
    /// `create_emoji`; name is the emoji name.
    CreateEmoji,
    /// `delete_emoji`; name is the emoji name.
    DeleteEmoji,
}

/// A recorded directory call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// `current_user`.
    CurrentUser,
    /// `fetch_workspace`.
    FetchWorkspace(GuildId),
    /// `accessible_workspaces`.
    AccessibleWorkspaces,
    /// `fetch_workspace_from_listing`.
    FetchWorkspaceFromListing(GuildId),
    /// `fetch_member`.
    FetchMember(GuildId, UserId),
    /// `edit_workspace`.
    EditWorkspace(WorkspaceEdit),
    /// `create_role`, by name.
    CreateRole(String),
    /// `delete_role`.
    DeleteRole(RoleId),
    /// `edit_role_positions`.
    EditRolePositions(Vec<RolePosition>),
    /// `create_category`.
    CreateCategory(NewCategory),
    /// `delete_category`.
    DeleteCategory(ChannelId),
    /// `create_text_channel`.
    CreateTextChannel(NewTextChannel),
    /// `create_voice_channel`.
    CreateVoiceChannel(NewVoiceChannel),
    /// `create_stage_channel`.
    CreateStageChannel(NewStageChannel),
    /// `delete_channel`.
    DeleteChannel(ChannelId),
    /// `create_emoji`, by name.
    CreateEmoji(String),
    /// `delete_emoji`.
    DeleteEmoji(EmojiId),
    /// `fetch_asset`, by URL.
    FetchAsset(String),
}

impl Call {
    /// Returns true for calls that change a guild.
    pub fn is_mutation(&self) -> bool {
        !matches!(
            self,
            Call::CurrentUser
                | Call::FetchWorkspace(_)
                | Call::AccessibleWorkspaces
                | Call::FetchWorkspaceFromListing(_)
                | Call::FetchMember(..)
                | Call::FetchAsset(_)
        )
    }
}

#[derive(Debug)]
struct Fault {
    op: FaultOp,
    name: String,
    error: DirectoryError,
}

#[derive(Debug)]
struct State {
    user: UserId,
    workspaces: HashMap<GuildId, Workspace>,
    listed_only: HashSet<GuildId>,
    members: HashMap<(GuildId, UserId), Member>,
    assets: HashMap<String, std::result::Result<Bytes, u16>>,
    emoji_capacity: Option<usize>,
    faults: Vec<Fault>,
    calls: Vec<Call>,
    next_id: u64,
}

impl State {
    fn fault(&self, op: FaultOp, name: &str) -> Result<()> {
        match self
            .faults
            .iter()
            .find(|f| f.op == op && (f.name == "*" || f.name == name))
        {
            Some(fault) => Err(fault.error.clone()),
            None => Ok(()),
        }
    }

    fn mint(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn guild(&mut self, id: GuildId) -> Result<&mut Workspace> {
        self.workspaces.get_mut(&id).ok_or_else(|| DirectoryError::NotFound {
            what: format!("guild {id}"),
        })
    }

    fn push_channel(&mut self, guild: GuildId, name: &str, parent: Option<ChannelId>, kind: ChannelKind) -> Result<ChannelId> {
        self.fault(FaultOp::CreateChannel, name)?;
        let id = ChannelId(self.mint());
        let ws = self.guild(guild)?;
        if let Some(parent) = parent {
            if ws.category(parent).is_none() {
                return Err(DirectoryError::NotFound {
                    what: format!("category {parent}"),
                });
            }
        }
        let position = ws.channels.len() as i64;
        let mut channel = Channel::with_kind(id, name, position, kind);
        channel.parent = parent;
        ws.channels.push(channel);
        Ok(id)
    }
}

/// In-memory directory service.
#[derive(Debug)]
pub struct MemoryDirectory {
    state: Mutex<State>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDirectory {
    /// An empty directory authenticated as user 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                user: UserId(1),
                workspaces: HashMap::new(),
                listed_only: HashSet::new(),
                members: HashMap::new(),
                assets: HashMap::new(),
                emoji_capacity: None,
                faults: Vec::new(),
                calls: Vec::new(),
                next_id: 1_000_000,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Set the user the session is authenticated as.
    pub fn set_user(&self, user: UserId) {
        self.state().user = user;
    }

    /// Store a guild that can be fetched directly.
    pub fn insert_workspace(&self, workspace: Workspace) {
        self.state().workspaces.insert(workspace.id, workspace);
    }

    /// Store a guild that refuses direct fetches but shows up in the listing.
    pub fn insert_listed_workspace(&self, workspace: Workspace) {
        let mut state = self.state();
        state.listed_only.insert(workspace.id);
        state.workspaces.insert(workspace.id, workspace);
    }

    /// Store a member record.
    pub fn insert_member(&self, guild: GuildId, member: Member) {
        let mut state = self.state();
        if let Some(ws) = state.workspaces.get_mut(&guild) {
            ws.members.insert(member.user_id);
        }
        state.members.insert((guild, member.user_id), member);
    }

    /// Serve `bytes` for an asset URL.
    pub fn insert_asset(&self, url: &str, bytes: Bytes) {
        self.state().assets.insert(url.to_owned(), Ok(bytes));
    }

    /// Answer an asset URL with a non-success HTTP status.
    pub fn insert_asset_status(&self, url: &str, status: u16) {
        self.state().assets.insert(url.to_owned(), Err(status));
    }

    /// Limit the number of emoji any guild can hold.
    pub fn set_emoji_capacity(&self, capacity: usize) {
        self.state().emoji_capacity = Some(capacity);
    }

    /// Fail `op` for the entity called `name` (`*` matches every entity).
    pub fn fail(&self, op: FaultOp, name: impl Into<String>, error: DirectoryError) {
        self.state().faults.push(Fault {
            op,
            name: name.into(),
            error,
        });
    }

    /// Current state of a stored guild.
    pub fn workspace(&self, id: GuildId) -> Option<Workspace> {
        self.state().workspaces.get(&id).cloned()
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    /// Calls that changed a guild, in order.
    pub fn mutations(&self) -> Vec<Call> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn current_user(&self) -> Result<UserId> {
        let mut state = self.state();
        state.calls.push(Call::CurrentUser);
        state.fault(FaultOp::CurrentUser, "*")?;
        Ok(state.user)
    }

    async fn fetch_workspace(&self, id: GuildId) -> Result<Workspace> {
        let mut state = self.state();
        state.calls.push(Call::FetchWorkspace(id));
        state.fault(FaultOp::FetchWorkspace, &id.to_string())?;
        if state.listed_only.contains(&id) {
            return Err(DirectoryError::Forbidden {
                msg: "Missing Access".into(),
            });
        }
        state.guild(id).map(|ws| ws.clone())
    }

    async fn accessible_workspaces(&self) -> Result<Vec<WorkspaceSummary>> {
        let mut state = self.state();
        state.calls.push(Call::AccessibleWorkspaces);
        let mut listing: Vec<WorkspaceSummary> =
            state.workspaces.values().map(Workspace::summary).collect();
        listing.sort_by_key(|s| s.id);
        Ok(listing)
    }

    async fn fetch_workspace_from_listing(&self, summary: &WorkspaceSummary) -> Result<Workspace> {
        let mut state = self.state();
        state.calls.push(Call::FetchWorkspaceFromListing(summary.id));
        state.guild(summary.id).map(|ws| ws.clone())
    }

    async fn fetch_member(&self, guild: GuildId, user: UserId) -> Result<Member> {
        let mut state = self.state();
        state.calls.push(Call::FetchMember(guild, user));
        state.fault(FaultOp::FetchMember, &user.to_string())?;
        state
            .members
            .get(&(guild, user))
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound {
                what: format!("member {user}"),
            })
    }

    async fn edit_workspace(&self, guild: GuildId, edit: &WorkspaceEdit, _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::EditWorkspace(edit.clone()));
        if edit.name.is_some() {
            state.fault(FaultOp::EditWorkspace, "rename")?;
        }
        if edit.icon.is_some() {
            state.fault(FaultOp::EditWorkspace, "icon")?;
        }
        if edit.banner.is_some() {
            state.fault(FaultOp::EditWorkspace, "banner")?;
        }
        let ws = state.guild(guild)?;
        if let Some(name) = &edit.name {
            ws.name = name.clone();
        }
        if edit.icon.is_some() {
            ws.icon = Some(AssetRef::new(format!("memory://{guild}/icon")));
        }
        if edit.banner.is_some() {
            ws.banner = Some(AssetRef::new(format!("memory://{guild}/banner")));
        }
        Ok(())
    }

    async fn create_role(&self, guild: GuildId, role: &NewRole, _reason: &str) -> Result<RoleId> {
        let mut state = self.state();
        state.calls.push(Call::CreateRole(role.name.clone()));
        state.fault(FaultOp::CreateRole, &role.name)?;
        let id = RoleId(state.mint());
        let ws = state.guild(guild)?;
        // New roles land just above the default role.
        let default_role = ws.default_role;
        for existing in ws.roles.iter_mut().filter(|r| r.id != default_role) {
            existing.position += 1;
        }
        let mut created = Role::new(id, role.name.clone(), 1);
        created.permissions = role.permissions;
        created.color = role.color;
        created.hoist = role.hoist;
        created.mentionable = role.mentionable;
        ws.roles.push(created);
        Ok(id)
    }

    async fn delete_role(&self, guild: GuildId, role: RoleId, _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteRole(role));
        let name = state
            .guild(guild)?
            .role(role)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        state.fault(FaultOp::DeleteRole, &name)?;
        let ws = state.guild(guild)?;
        if role == ws.default_role {
            return Err(DirectoryError::Service {
                status: 400,
                code: Some(50028),
                msg: "Invalid Role".into(),
            });
        }
        ws.roles.retain(|r| r.id != role);
        Ok(())
    }

    async fn edit_role_positions(&self, guild: GuildId, positions: &[RolePosition], _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::EditRolePositions(positions.to_vec()));
        state.fault(FaultOp::EditRolePositions, "*")?;
        let ws = state.guild(guild)?;
        for entry in positions {
            match ws.roles.iter_mut().find(|r| r.id == entry.id) {
                Some(role) => role.position = entry.position,
                None => {
                    return Err(DirectoryError::NotFound {
                        what: format!("role {}", entry.id),
                    })
                }
            }
        }
        Ok(())
    }

    async fn create_category(&self, guild: GuildId, category: &NewCategory, _reason: &str) -> Result<ChannelId> {
        let mut state = self.state();
        state.calls.push(Call::CreateCategory(category.clone()));
        state.fault(FaultOp::CreateCategory, &category.name)?;
        let id = ChannelId(state.mint());
        let ws = state.guild(guild)?;
        let mut created = Category::new(id, category.name.clone(), ws.categories.len() as i64);
        created.overwrites = category.overwrites.clone();
        ws.categories.push(created);
        Ok(id)
    }

    async fn delete_category(&self, guild: GuildId, category: ChannelId, _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteCategory(category));
        let name = state
            .guild(guild)?
            .category(category)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        state.fault(FaultOp::DeleteCategory, &name)?;
        let ws = state.guild(guild)?;
        ws.categories.retain(|c| c.id != category);
        for child in ws.channels.iter_mut().filter(|c| c.parent == Some(category)) {
            child.parent = None;
        }
        Ok(())
    }

    async fn create_text_channel(&self, guild: GuildId, channel: &NewTextChannel, _reason: &str) -> Result<ChannelId> {
        let mut state = self.state();
        state.calls.push(Call::CreateTextChannel(channel.clone()));
        let kind = ChannelKind::Text {
            topic: channel.topic.clone(),
            slowmode_secs: channel.slowmode_secs,
            nsfw: channel.nsfw,
        };
        let id = state.push_channel(guild, &channel.name, channel.parent, kind)?;
        set_overwrites(&mut state, guild, id, channel.overwrites.clone());
        Ok(id)
    }

    async fn create_voice_channel(&self, guild: GuildId, channel: &NewVoiceChannel, _reason: &str) -> Result<ChannelId> {
        let mut state = self.state();
        state.calls.push(Call::CreateVoiceChannel(channel.clone()));
        let kind = ChannelKind::Voice {
            bitrate: channel.bitrate,
            user_limit: channel.user_limit,
        };
        let id = state.push_channel(guild, &channel.name, channel.parent, kind)?;
        set_overwrites(&mut state, guild, id, channel.overwrites.clone());
        Ok(id)
    }

    async fn create_stage_channel(&self, guild: GuildId, channel: &NewStageChannel, _reason: &str) -> Result<ChannelId> {
        let mut state = self.state();
        state.calls.push(Call::CreateStageChannel(channel.clone()));
        let kind = ChannelKind::Stage {
            topic: channel.topic.clone(),
        };
        let id = state.push_channel(guild, &channel.name, channel.parent, kind)?;
        set_overwrites(&mut state, guild, id, channel.overwrites.clone());
        Ok(id)
    }

    async fn delete_channel(&self, guild: GuildId, channel: ChannelId, _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteChannel(channel));
        let name = state
            .guild(guild)?
            .channels
            .iter()
            .find(|c| c.id == channel)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        state.fault(FaultOp::DeleteChannel, &name)?;
        state.guild(guild)?.channels.retain(|c| c.id != channel);
        Ok(())
    }

    async fn create_emoji(&self, guild: GuildId, name: &str, _image: &[u8], _reason: &str) -> Result<EmojiId> {
        let mut state = self.state();
        state.calls.push(Call::CreateEmoji(name.to_owned()));
        state.fault(FaultOp::CreateEmoji, name)?;
        let capacity = state.emoji_capacity;
        let id = EmojiId(state.mint());
        let ws = state.guild(guild)?;
        if capacity.is_some_and(|cap| ws.emojis.len() >= cap) {
            return Err(DirectoryError::EmojiCapacityExhausted);
        }
        ws.emojis.push(Emoji {
            id,
            name: name.to_owned(),
            animated: false,
            asset: AssetRef::new(format!("memory://{guild}/emojis/{id}")),
        });
        Ok(id)
    }

    async fn delete_emoji(&self, guild: GuildId, emoji: EmojiId, _reason: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(Call::DeleteEmoji(emoji));
        let name = state
            .guild(guild)?
            .emojis
            .iter()
            .find(|e| e.id == emoji)
            .map(|e| e.name.clone())
            .unwrap_or_default();
        state.fault(FaultOp::DeleteEmoji, &name)?;
        state.guild(guild)?.emojis.retain(|e| e.id != emoji);
        Ok(())
    }

    async fn fetch_asset(&self, asset: &AssetRef) -> Result<Bytes> {
        let mut state = self.state();
        state.calls.push(Call::FetchAsset(asset.url.clone()));
        match state.assets.get(&asset.url) {
            Some(Ok(bytes)) => Ok(bytes.clone()),
            Some(Err(status)) => Err(DirectoryError::AssetStatus { status: *status }),
            None => Err(DirectoryError::AssetStatus { status: 404 }),
        }
    }
}

fn set_overwrites(
    state: &mut State,
    guild: GuildId,
    channel: ChannelId,
    overwrites: Vec<crate::model::PermissionOverwrite>,
) {
    if let Some(created) = state
        .workspaces
        .get_mut(&guild)
        .and_then(|ws| ws.channels.iter_mut().find(|c| c.id == channel))
    {
        created.overwrites = overwrites;
    }
}
