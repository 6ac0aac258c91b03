//! Emoji phase: download each source emoji and upload it to the target.

use tracing::info;

use crate::directory::Directory;
use crate::error::Cancelled;
use crate::model::Workspace;
use crate::outcome::{Outcome, Step};
use crate::pacing::{PaceKind, Pacer};
use crate::report::{Phase, PhaseReport};
use crate::roles::CLONE_REASON;

/// Copy emoji in source order.
///
/// A failed download or upload skips that emoji only. The first capacity
/// signal from the target ends the phase; the remaining emoji are counted as
/// unattempted and never tried.
pub async fn replicate_emoji<D>(
    directory: &D,
    pacer: &Pacer,
    source: &Workspace,
    target: &Workspace,
) -> Result<PhaseReport, Cancelled>
where
    D: Directory + ?Sized,
{
    let mut report = PhaseReport::new(Phase::Emoji);
    info!(count = source.emojis.len(), "cloning emoji");

    for (index, emoji) in source.emojis.iter().enumerate() {
        let entity = format!("emoji \"{}\"", emoji.name);

        let image = match Outcome::from_result(
            Step::FetchEmojiImage,
            directory.fetch_asset(&emoji.asset).await,
        ) {
            Outcome::Done(image) => image,
            Outcome::Skipped(failure)
            | Outcome::PhaseAborted(failure)
            | Outcome::Fatal(failure) => {
                failure.log(&entity);
                report.record_skip(entity, &failure);
                continue;
            }
        };

        let result = directory
            .create_emoji(target.id, &emoji.name, &image, CLONE_REASON)
            .await;
        match Outcome::from_result(Step::UploadEmoji, result) {
            Outcome::Done(new_id) => {
                info!(target = %new_id, "emoji created: {}", emoji.name);
                report.record_success();
                pacer.pause(PaceKind::EmojiCreate).await?;
            }
            Outcome::PhaseAborted(failure) => {
                failure.log(&entity);
                report.record_skip(entity, &failure);
                let left = source.emojis.len() - index - 1;
                report.abort("emoji limit reached in the target guild", left);
                break;
            }
            Outcome::Skipped(failure) | Outcome::Fatal(failure) => {
                failure.log(&entity);
                report.record_skip(entity, &failure);
            }
        }
    }

    Ok(report)
}
