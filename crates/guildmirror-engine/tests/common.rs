//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use guildmirror_engine::memory::MemoryDirectory;
use guildmirror_engine::model::{
    AssetRef, Category, Channel, ChannelKind, Emoji, Member, OverwriteSubject,
    PermissionOverwrite, Role, Workspace,
};
use guildmirror_engine::{
    ChannelId, CloneEngine, EmojiId, GuildId, PacingConfig, Permissions, RoleId, UserId,
};
use tokio_util::sync::CancellationToken;

pub const SOURCE: GuildId = GuildId(111_111_111_111_111_111);
pub const TARGET: GuildId = GuildId(222_222_222_222_222_222);
pub const ME: UserId = UserId(900);
pub const SHARED_MEMBER: UserId = UserId(901);
pub const SOURCE_ONLY_MEMBER: UserId = UserId(902);

pub const ADMIN: RoleId = RoleId(13);
pub const MOD: RoleId = RoleId(12);
pub const MEMBER: RoleId = RoleId(11);

pub const GENERAL: ChannelId = ChannelId(100);
pub const CHAT: ChannelId = ChannelId(200);

pub const ICON_URL: &str = "https://cdn.example/icons/source.png";
pub const BANNER_URL: &str = "https://cdn.example/banners/source.png";

fn role(id: RoleId, name: &str, position: i64, permissions: Permissions) -> Role {
    let mut role = Role::new(id, name, position);
    role.permissions = permissions;
    role
}

pub fn emoji_url(id: u64) -> String {
    format!("https://cdn.example/emojis/{id}.png")
}

/// Source guild: three roles, one category with a text channel, a voice
/// channel at the top level, three emoji, icon and banner.
pub fn source_guild() -> Workspace {
    let mut ws = Workspace::new(SOURCE, "Source Guild");
    ws.icon = Some(AssetRef::new(ICON_URL));
    ws.banner = Some(AssetRef::new(BANNER_URL));
    ws.roles.push(role(ADMIN, "Admin", 3, Permissions::ADMINISTRATOR));
    ws.roles.push(role(MOD, "Mod", 2, Permissions::KICK_MEMBERS | Permissions::MANAGE_MESSAGES));
    ws.roles.push(role(MEMBER, "Member", 1, Permissions::SEND_MESSAGES));
    ws.members.insert(SHARED_MEMBER);
    ws.members.insert(SOURCE_ONLY_MEMBER);

    let mut general = Category::new(GENERAL, "General", 0);
    general.overwrites.push(PermissionOverwrite::new(
        OverwriteSubject::DefaultRole,
        Permissions::empty(),
        Permissions::VIEW_CHANNEL,
    ));
    ws.categories.push(general);

    ws.channels.push(
        Channel::with_kind(
            CHAT,
            "chat",
            0,
            ChannelKind::Text {
                topic: Some("talk here".into()),
                slowmode_secs: 5,
                nsfw: false,
            },
        )
        .in_category(GENERAL)
        .with_overwrite(PermissionOverwrite::new(
            OverwriteSubject::Role(MOD),
            Permissions::VIEW_CHANNEL,
            Permissions::empty(),
        ))
        .with_overwrite(PermissionOverwrite::new(
            OverwriteSubject::Member(SHARED_MEMBER),
            Permissions::SEND_MESSAGES,
            Permissions::empty(),
        ))
        .with_overwrite(PermissionOverwrite::new(
            OverwriteSubject::Member(SOURCE_ONLY_MEMBER),
            Permissions::SEND_MESSAGES,
            Permissions::empty(),
        )),
    );
    ws.channels.push(Channel::voice(ChannelId(201), "Lounge", 1));

    for (i, name) in ["wave", "party", "cat"].iter().enumerate() {
        let id = 300 + i as u64;
        ws.emojis.push(Emoji {
            id: EmojiId(id),
            name: (*name).into(),
            animated: false,
            asset: AssetRef::new(emoji_url(id)),
        });
    }
    ws
}

/// Target guild with leftovers from a previous life.
pub fn target_guild() -> Workspace {
    let mut ws = Workspace::new(TARGET, "Target Guild");
    ws.owner_id = Some(ME);
    ws.roles.push(Role::new(RoleId(51), "Old Low", 1));
    ws.roles.push(Role::new(RoleId(52), "Old High", 2));
    ws.categories.push(Category::new(ChannelId(60), "Old Category", 0));
    ws.channels
        .push(Channel::text(ChannelId(61), "old-chat", 0).in_category(ChannelId(60)));
    ws.emojis.push(Emoji {
        id: EmojiId(70),
        name: "old".into(),
        animated: false,
        asset: AssetRef::new("https://cdn.example/emojis/70.png"),
    });
    ws.members.insert(SHARED_MEMBER);
    ws
}

/// A directory holding both fixtures, every asset, and the session user as a
/// target member.
pub fn directory() -> MemoryDirectory {
    let dir = MemoryDirectory::new();
    dir.set_user(ME);
    dir.insert_workspace(source_guild());
    dir.insert_workspace(target_guild());
    dir.insert_member(
        TARGET,
        Member {
            user_id: ME,
            roles: vec![],
        },
    );
    dir.insert_asset(ICON_URL, Bytes::from_static(b"\x89PNG\r\n\x1a\nicon"));
    dir.insert_asset(BANNER_URL, Bytes::from_static(b"\x89PNG\r\n\x1a\nbanner"));
    for id in 300..303 {
        dir.insert_asset(&emoji_url(id), Bytes::from_static(b"GIF89a"));
    }
    dir
}

pub fn engine(dir: MemoryDirectory) -> CloneEngine<MemoryDirectory> {
    CloneEngine::new(dir, PacingConfig::none(), CancellationToken::new())
}

/// Roles of a guild, most senior first, default role excluded.
pub fn role_names_by_seniority(ws: &Workspace) -> Vec<String> {
    let mut roles: Vec<&Role> = ws.replicable_roles().collect();
    roles.sort_by(|a, b| b.position.cmp(&a.position));
    roles.into_iter().map(|r| r.name.clone()).collect()
}

pub fn role_named<'a>(ws: &'a Workspace, name: &str) -> Option<&'a Role> {
    ws.roles.iter().find(|r| r.name == name)
}
