//! Branding phase: guild name, icon and banner.

use bytes::Bytes;
use tracing::info;

use crate::directory::{Directory, WorkspaceEdit};
use crate::error::Cancelled;
use crate::model::{AssetRef, Workspace};
use crate::outcome::{Outcome, Step};
use crate::pacing::{PaceKind, Pacer};
use crate::report::{Phase, PhaseReport};
use crate::roles::CLONE_REASON;

/// Name given to the target: the source name with a clone marker.
pub fn clone_name(source_name: &str) -> String {
    format!("{source_name} (Clone)")
}

/// Copy name, icon and banner from `source` to `target`.
///
/// The icon is only copied when `clone_icon` is set; the banner is always
/// attempted when the source has one. A failed rename ends the phase.
pub async fn replicate_branding<D>(
    directory: &D,
    pacer: &Pacer,
    source: &Workspace,
    target: &Workspace,
    clone_icon: bool,
) -> Result<PhaseReport, Cancelled>
where
    D: Directory + ?Sized,
{
    let mut report = PhaseReport::new(Phase::Branding);
    let pending_assets = usize::from(clone_icon && source.icon.is_some())
        + usize::from(source.banner.is_some());

    if source.name != target.name {
        let name = clone_name(&source.name);
        let result = directory
            .edit_workspace(target.id, &WorkspaceEdit::rename(&name), CLONE_REASON)
            .await;
        match Outcome::from_result(Step::RenameWorkspace, result) {
            Outcome::Done(()) => {
                info!(name = %name, "guild renamed");
                report.record_success();
                pacer.pause(PaceKind::PermissionUpdate).await?;
            }
            Outcome::PhaseAborted(failure) | Outcome::Skipped(failure) | Outcome::Fatal(failure) => {
                failure.log("guild settings");
                report.record_skip("guild name", &failure);
                report.abort("cannot modify guild settings", pending_assets);
                return Ok(report);
            }
        }
    }

    match (&source.icon, clone_icon) {
        (Some(icon), true) => {
            copy_asset(directory, pacer, target, icon, Step::CopyIcon, &mut report).await?;
        }
        (_, false) => {
            info!("guild icon not cloned (option disabled)");
            report.note("icon not cloned (option disabled)");
        }
        (None, true) => {}
    }

    if let Some(banner) = &source.banner {
        copy_asset(directory, pacer, target, banner, Step::CopyBanner, &mut report).await?;
    }

    Ok(report)
}

async fn copy_asset<D>(
    directory: &D,
    pacer: &Pacer,
    target: &Workspace,
    asset: &AssetRef,
    step: Step,
    report: &mut PhaseReport,
) -> Result<(), Cancelled>
where
    D: Directory + ?Sized,
{
    let entity = if step == Step::CopyIcon {
        "guild icon"
    } else {
        "guild banner"
    };

    let result = match directory.fetch_asset(asset).await {
        Ok(image) => {
            let edit = edit_for(step, image);
            directory.edit_workspace(target.id, &edit, CLONE_REASON).await
        }
        Err(err) => Err(err),
    };

    match Outcome::from_result(step, result) {
        Outcome::Done(()) => {
            info!("{entity} copied");
            report.record_success();
            pacer.pause(PaceKind::PermissionUpdate).await?;
        }
        Outcome::Skipped(failure) | Outcome::PhaseAborted(failure) | Outcome::Fatal(failure) => {
            failure.log(entity);
            report.record_skip(entity, &failure);
        }
    }
    Ok(())
}

fn edit_for(step: Step, image: Bytes) -> WorkspaceEdit {
    if step == Step::CopyIcon {
        WorkspaceEdit::icon(image)
    } else {
        WorkspaceEdit::banner(image)
    }
}
