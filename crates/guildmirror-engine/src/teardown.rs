//! Teardown phase: empties the target guild before replication.

use tracing::info;

use crate::directory::Directory;
use crate::error::Cancelled;
use crate::model::Workspace;
use crate::outcome::{Outcome, Step};
use crate::pacing::{PaceKind, Pacer};
use crate::report::{Phase, PhaseReport};

/// Audit-log reason attached to every teardown deletion.
pub const TEARDOWN_REASON: &str = "Cleaning before cloning";

/// Delete every channel, category, non-default role and emoji of `target`.
///
/// Order is channels, categories, roles (most senior first), emoji. Each
/// deletion stands alone: a failure is logged, recorded in the report, and the
/// loop moves on. The returned report's [`PhaseReport::completed`] is
/// informational; later phases run regardless.
pub async fn teardown<D>(
    directory: &D,
    pacer: &Pacer,
    target: &Workspace,
) -> Result<PhaseReport, Cancelled>
where
    D: Directory + ?Sized,
{
    let mut report = PhaseReport::new(Phase::Teardown);
    let guild = target.id;
    info!(guild = %guild, "cleaning target guild");

    for channel in &target.channels {
        let entity = format!("channel \"{}\"", channel.name);
        let result = directory.delete_channel(guild, channel.id, TEARDOWN_REASON).await;
        if record(&mut report, &entity, Step::DeleteChannel, result) {
            pacer.pause(PaceKind::Delete).await?;
        }
    }

    for category in &target.categories {
        let entity = format!("category \"{}\"", category.name);
        let result = directory
            .delete_category(guild, category.id, TEARDOWN_REASON)
            .await;
        if record(&mut report, &entity, Step::DeleteCategory, result) {
            pacer.pause(PaceKind::Delete).await?;
        }
    }

    let mut roles: Vec<_> = target.replicable_roles().collect();
    roles.sort_by(|a, b| b.position.cmp(&a.position));
    for role in roles {
        let entity = format!("role \"{}\"", role.name);
        let result = directory.delete_role(guild, role.id, TEARDOWN_REASON).await;
        if record(&mut report, &entity, Step::DeleteRole, result) {
            pacer.pause(PaceKind::Delete).await?;
        }
    }

    for emoji in &target.emojis {
        let entity = format!("emoji \"{}\"", emoji.name);
        let result = directory.delete_emoji(guild, emoji.id, TEARDOWN_REASON).await;
        if record(&mut report, &entity, Step::DeleteEmoji, result) {
            pacer.pause(PaceKind::EmojiDelete).await?;
        }
    }

    info!(
        deleted = report.succeeded,
        skipped = report.skipped.len(),
        "target guild cleaned"
    );
    Ok(report)
}

/// Fold one deletion into the report. Returns true on success.
fn record(
    report: &mut PhaseReport,
    entity: &str,
    step: Step,
    result: crate::directory::Result<()>,
) -> bool {
    match Outcome::from_result(step, result) {
        Outcome::Done(()) => {
            info!("{step}: {entity}");
            report.record_success();
            true
        }
        Outcome::Skipped(failure)
        | Outcome::PhaseAborted(failure)
        | Outcome::Fatal(failure) => {
            failure.log(entity);
            report.record_skip(entity, &failure);
            false
        }
    }
}
