//! REST client behaviour against a canned HTTP server.

mod common;

use bytes::Bytes;
use common::{MockServer, TOKEN};
use guildmirror_engine::directory::{NewCategory, NewRole, NewTextChannel, RolePosition, WorkspaceEdit};
use guildmirror_engine::model::{AssetRef, ChannelKind, OverwriteSubject, PermissionOverwrite};
use guildmirror_engine::{
    ChannelId, Directory, DirectoryError, GuildId, Permissions, RoleId, UserId,
};

const GUILD_JSON: &str = r#"{
    "id": "1000", "name": "Source", "icon": "abc", "banner": null, "owner_id": "5",
    "roles": [
        {"id": "1000", "name": "@everyone", "permissions": "1024", "position": 0},
        {"id": "2", "name": "Mod", "permissions": "8194", "position": 1, "color": 16711680,
         "hoist": true, "mentionable": true}
    ],
    "emojis": [{"id": "3", "name": "wave", "animated": true}]
}"#;

const CHANNELS_JSON: &str = r#"[
    {"id": "10", "type": 4, "name": "General", "position": 0,
     "permission_overwrites": [{"id": "1000", "type": 0, "allow": "0", "deny": "1024"}]},
    {"id": "11", "type": 0, "name": "chat", "position": 0, "parent_id": "10",
     "permission_overwrites": [{"id": "2", "type": 0, "allow": "1024", "deny": "0"}]},
    {"id": "12", "type": 15, "name": "help", "position": 1, "parent_id": "10"}
]"#;

const MEMBERS_JSON: &str = r#"[
    {"user": {"id": "5", "username": "owner"}, "roles": []},
    {"user": {"id": "6", "username": "other"}, "roles": ["2"]}
]"#;

#[tokio::test]
async fn test_current_user_sends_bot_authorization() {
    let server = MockServer::start(vec![(200, r#"{"id": "42", "username": "cloner"}"#)]).await;
    let user = server.client().current_user().await.unwrap();
    assert_eq!(user, UserId(42));

    let req = &server.requests()[0];
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "/users/@me");
    assert_eq!(req.header("authorization"), Some(format!("Bot {TOKEN}").as_str()));
}

#[tokio::test]
async fn test_unauthorized_session() {
    let server = MockServer::start(vec![(401, r#"{"message": "401: Unauthorized", "code": 0}"#)]).await;
    let err = server.client().current_user().await.unwrap_err();
    assert!(matches!(err, DirectoryError::Unauthorized { .. }));
}

#[tokio::test]
async fn test_fetch_workspace_assembles_snapshot() {
    let server = MockServer::start(vec![
        (200, GUILD_JSON),
        (200, CHANNELS_JSON),
        (200, MEMBERS_JSON),
    ])
    .await;
    let ws = server.client().fetch_workspace(GuildId(1000)).await.unwrap();

    assert_eq!(ws.name, "Source");
    assert_eq!(ws.default_role, RoleId(1000));
    assert_eq!(ws.icon.as_ref().unwrap().url, format!("{}/icons/1000/abc.png", server.base));
    let mod_role = ws.role(RoleId(2)).unwrap();
    assert_eq!(
        mod_role.permissions,
        Permissions::KICK_MEMBERS | Permissions::MANAGE_MESSAGES
    );
    assert!(mod_role.hoist);
    assert_eq!(ws.categories[0].overwrites[0].subject, OverwriteSubject::DefaultRole);
    assert_eq!(ws.channels[0].parent, Some(ChannelId(10)));
    assert_eq!(ws.channels[1].kind, ChannelKind::Other { type_code: 15 });
    assert_eq!(ws.emojis[0].asset.url, format!("{}/emojis/3.gif", server.base));
    assert!(ws.has_member(UserId(5)));
    assert!(ws.has_member(UserId(6)));

    let paths: Vec<String> = server.requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/guilds/1000".to_string(),
            "/guilds/1000/channels".to_string(),
            "/guilds/1000/members?limit=1000&after=0".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_member_listing_refusal_gives_empty_set() {
    let server = MockServer::start(vec![
        (200, GUILD_JSON),
        (200, CHANNELS_JSON),
        (403, r#"{"message": "Missing Access", "code": 50001}"#),
    ])
    .await;
    let ws = server.client().fetch_workspace(GuildId(1000)).await.unwrap();
    assert!(ws.members.is_empty());
    assert_eq!(ws.channels.len(), 2);
}

#[tokio::test]
async fn test_forbidden_and_missing_guild() {
    let server = MockServer::start(vec![
        (403, r#"{"message": "Missing Access", "code": 50001}"#),
        (404, r#"{"message": "Unknown Guild", "code": 10004}"#),
    ])
    .await;
    let client = server.client();
    assert!(matches!(
        client.fetch_workspace(GuildId(1)).await.unwrap_err(),
        DirectoryError::Forbidden { .. }
    ));
    assert!(matches!(
        client.fetch_workspace(GuildId(2)).await.unwrap_err(),
        DirectoryError::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_create_role_body_and_reason() {
    let server = MockServer::start(vec![(200, r#"{"id": "77", "name": "Mod"}"#)]).await;
    let role = NewRole {
        name: "Mod".into(),
        permissions: Permissions::KICK_MEMBERS,
        color: 255,
        hoist: true,
        mentionable: false,
    };
    let id = server
        .client()
        .create_role(GuildId(1000), &role, "Server cloning")
        .await
        .unwrap();
    assert_eq!(id, RoleId(77));

    let req = &server.requests()[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/guilds/1000/roles");
    assert_eq!(req.header("x-audit-log-reason"), Some("Server cloning"));
    assert_eq!(
        req.json(),
        serde_json::json!({
            "name": "Mod", "permissions": "2", "color": 255, "hoist": true, "mentionable": false
        })
    );
}

#[tokio::test]
async fn test_role_positions_patch() {
    let server = MockServer::start(vec![(200, "[]")]).await;
    server
        .client()
        .edit_role_positions(
            GuildId(1000),
            &[
                RolePosition { id: RoleId(3), position: 2 },
                RolePosition { id: RoleId(4), position: 1 },
            ],
            "Hierarchical reordering of roles",
        )
        .await
        .unwrap();
    let req = &server.requests()[0];
    assert_eq!(req.method, "PATCH");
    assert_eq!(
        req.json(),
        serde_json::json!([{"id": "3", "position": 2}, {"id": "4", "position": 1}])
    );
}

#[tokio::test]
async fn test_text_channel_payload() {
    let server = MockServer::start(vec![(201, r#"{"id": "55", "type": 0}"#)]).await;
    let channel = NewTextChannel {
        name: "chat".into(),
        topic: Some("hello".into()),
        slowmode_secs: 10,
        nsfw: false,
        parent: Some(ChannelId(9)),
        overwrites: vec![PermissionOverwrite::new(
            OverwriteSubject::Role(RoleId(1000)),
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        )],
    };
    let id = server
        .client()
        .create_text_channel(GuildId(1000), &channel, "Server cloning")
        .await
        .unwrap();
    assert_eq!(id, ChannelId(55));
    assert_eq!(
        server.requests()[0].json(),
        serde_json::json!({
            "name": "chat", "type": 0, "topic": "hello", "rate_limit_per_user": 10,
            "nsfw": false, "parent_id": "9",
            "permission_overwrites": [{"id": "1000", "type": 0, "allow": "0", "deny": "1024"}]
        })
    );
}

#[tokio::test]
async fn test_category_payload_has_no_parent() {
    let server = MockServer::start(vec![(201, r#"{"id": "56", "type": 4}"#)]).await;
    let category = NewCategory {
        name: "General".into(),
        overwrites: Vec::new(),
    };
    server
        .client()
        .create_category(GuildId(1000), &category, "Server cloning")
        .await
        .unwrap();
    assert_eq!(
        server.requests()[0].json(),
        serde_json::json!({"name": "General", "type": 4, "permission_overwrites": []})
    );
}

#[tokio::test]
async fn test_emoji_capacity_and_data_uri() {
    let server = MockServer::start(vec![(
        400,
        r#"{"message": "Maximum number of emojis reached (50)", "code": 30008}"#,
    )])
    .await;
    let err = server
        .client()
        .create_emoji(GuildId(1000), "wave", b"GIF89a", "Server cloning")
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::EmojiCapacityExhausted);
    let body = server.requests()[0].json();
    assert_eq!(body["image"], "data:image/gif;base64,R0lGODlh");
    assert_eq!(body["name"], "wave");
}

#[tokio::test]
async fn test_rate_limit_not_retried() {
    let server = MockServer::start(vec![(
        429,
        r#"{"message": "You are being rate limited.", "retry_after": 0.25, "global": false}"#,
    )])
    .await;
    let err = server
        .client()
        .delete_channel(GuildId(1000), ChannelId(5), "Cleaning before cloning")
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::RateLimited { retry_after_ms: 250 });
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_delete_no_content() {
    let server = MockServer::start(vec![(204, "")]).await;
    server
        .client()
        .delete_role(GuildId(1000), RoleId(2), "Cleaning before cloning")
        .await
        .unwrap();
    let req = &server.requests()[0];
    assert_eq!(req.method, "DELETE");
    assert_eq!(req.path, "/guilds/1000/roles/2");
}

#[tokio::test]
async fn test_edit_workspace_encodes_images() {
    let server = MockServer::start(vec![(200, r#"{"id": "1000"}"#)]).await;
    let edit = WorkspaceEdit::banner(Bytes::from_static(b"GIF89a"));
    server
        .client()
        .edit_workspace(GuildId(1000), &edit, "Server cloning")
        .await
        .unwrap();
    assert_eq!(
        server.requests()[0].json(),
        serde_json::json!({"banner": "data:image/gif;base64,R0lGODlh"})
    );
}

#[tokio::test]
async fn test_asset_download_status() {
    let server = MockServer::start(vec![(200, "GIF89a"), (404, "")]).await;
    let client = server.client();
    let ok = client
        .fetch_asset(&AssetRef::new(format!("{}/emojis/1.gif", server.base)))
        .await
        .unwrap();
    assert_eq!(ok, Bytes::from_static(b"GIF89a"));
    let err = client
        .fetch_asset(&AssetRef::new(format!("{}/emojis/2.gif", server.base)))
        .await
        .unwrap_err();
    assert_eq!(err, DirectoryError::AssetStatus { status: 404 });
    assert_eq!(server.requests()[0].header("authorization"), None);
}
