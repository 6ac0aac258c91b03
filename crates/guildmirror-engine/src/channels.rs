//! Category and channel phase.
//!
//! Categories go first so channels can be nested under their copies. Every
//! overwrite is rewritten through the identity map before it is sent.

use tracing::{debug, info};

use crate::directory::{Directory, NewCategory, NewStageChannel, NewTextChannel, NewVoiceChannel};
use crate::error::{Cancelled, DirectoryError};
use crate::id::{ChannelId, GuildId};
use crate::identity::IdentityMap;
use crate::model::{Category, Channel, ChannelKind, PermissionOverwrite, Workspace};
use crate::outcome::{Outcome, Step};
use crate::overwrite::{translate_overwrites, TranslationContext};
use crate::pacing::{PaceKind, Pacer};
use crate::report::{Phase, PhaseReport};
use crate::roles::CLONE_REASON;

/// Replicate categories, then channels, from `source` onto `target`.
///
/// Successful categories are recorded in `identity`. A channel whose parent
/// category failed to replicate is created without a parent.
pub async fn replicate_channels<D>(
    directory: &D,
    pacer: &Pacer,
    source: &Workspace,
    target: &Workspace,
    identity: &mut IdentityMap,
) -> Result<PhaseReport, Cancelled>
where
    D: Directory + ?Sized,
{
    let mut report = PhaseReport::new(Phase::Channels);

    let mut categories: Vec<&Category> = source.categories.iter().collect();
    categories.sort_by_key(|c| c.position);
    info!(count = categories.len(), "cloning categories");

    for category in categories {
        let entity = format!("category \"{}\"", category.name);
        let request = NewCategory {
            name: category.name.clone(),
            overwrites: translate_overwrites(
                &category.overwrites,
                &TranslationContext::new(identity, source, target),
            ),
        };
        let result = directory
            .create_category(target.id, &request, CLONE_REASON)
            .await;
        match Outcome::from_result(Step::CreateCategory, result) {
            Outcome::Done(new_id) => {
                identity.record_category(category.id, new_id);
                info!(source = %category.id, target = %new_id, "category created: {}", category.name);
                report.record_success();
                pacer.pause(PaceKind::ChannelCreate).await?;
            }
            Outcome::Skipped(failure)
            | Outcome::PhaseAborted(failure)
            | Outcome::Fatal(failure) => {
                failure.log(&entity);
                report.record_skip(entity, &failure);
            }
        }
    }

    let mut channels: Vec<&Channel> = source
        .channels
        .iter()
        .filter(|c| {
            if !c.kind.is_replicable() {
                debug!(channel = %c.name, kind = ?c.kind, "skipping unsupported channel type");
            }
            c.kind.is_replicable()
        })
        .collect();
    channels.sort_by_key(|c| c.position);
    info!(count = channels.len(), "cloning channels");

    let ctx = TranslationContext::new(identity, source, target);
    for channel in channels {
        let entity = format!("{} channel \"{}\"", channel.kind.label(), channel.name);
        let parent = channel.parent.and_then(|p| identity.category(p));
        if channel.parent.is_some() && parent.is_none() {
            debug!(channel = %channel.name, "parent category was not replicated, creating at top level");
        }
        let overwrites = translate_overwrites(&channel.overwrites, &ctx);

        let result = create_channel(directory, target.id, channel, parent, overwrites).await;
        match Outcome::from_result(Step::CreateChannel, result) {
            Outcome::Done(new_id) => {
                info!(target = %new_id, "{entity} created");
                report.record_success();
            }
            Outcome::Skipped(failure)
            | Outcome::PhaseAborted(failure)
            | Outcome::Fatal(failure) => {
                failure.log(&entity);
                report.record_skip(entity, &failure);
            }
        }
        pacer.pause(PaceKind::ChannelCreate).await?;
    }

    Ok(report)
}

/// Issue the creation request matching the channel's kind.
async fn create_channel<D>(
    directory: &D,
    guild: GuildId,
    channel: &Channel,
    parent: Option<ChannelId>,
    overwrites: Vec<PermissionOverwrite>,
) -> crate::directory::Result<ChannelId>
where
    D: Directory + ?Sized,
{
    let name = channel.name.clone();
    match &channel.kind {
        ChannelKind::Text {
            topic,
            slowmode_secs,
            nsfw,
        } => {
            let request = NewTextChannel {
                name,
                topic: topic.clone(),
                slowmode_secs: *slowmode_secs,
                nsfw: *nsfw,
                parent,
                overwrites,
            };
            directory
                .create_text_channel(guild, &request, CLONE_REASON)
                .await
        }
        ChannelKind::Voice {
            bitrate,
            user_limit,
        } => {
            let request = NewVoiceChannel {
                name,
                bitrate: *bitrate,
                user_limit: *user_limit,
                parent,
                overwrites,
            };
            directory
                .create_voice_channel(guild, &request, CLONE_REASON)
                .await
        }
        ChannelKind::Stage { topic } => {
            let request = NewStageChannel {
                name,
                topic: topic.clone(),
                parent,
                overwrites,
            };
            directory
                .create_stage_channel(guild, &request, CLONE_REASON)
                .await
        }
        ChannelKind::Other { type_code } => Err(DirectoryError::Unexpected {
            msg: format!("channel type {type_code} cannot be created"),
        }),
    }
}
