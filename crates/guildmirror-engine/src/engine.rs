//! The clone orchestrator: resolves both guilds, then runs the five phases in order.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::branding::replicate_branding;
use crate::channels::replicate_channels;
use crate::directory::Directory;
use crate::emoji::replicate_emoji;
use crate::error::{CloneError, DirectoryError};
use crate::id::{GuildId, UserId};
use crate::identity::IdentityMap;
use crate::model::Workspace;
use crate::outcome::{Outcome, Step};
use crate::pacing::{Pacer, PacingConfig};
use crate::permissions::Permissions;
use crate::report::{CloneReport, PhaseReport};
use crate::roles::replicate_roles;
use crate::teardown::teardown;

/// What to clone, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRequest {
    /// Guild to read from.
    pub source: GuildId,
    /// Guild to wipe and rebuild.
    pub target: GuildId,
    /// Copy the source icon onto the target.
    pub clone_icon: bool,
}

impl CloneRequest {
    /// Create a request that also copies the icon.
    pub fn new(source: GuildId, target: GuildId) -> Self {
        Self {
            source,
            target,
            clone_icon: true,
        }
    }

    /// Set whether the icon is copied.
    pub fn with_clone_icon(mut self, clone_icon: bool) -> Self {
        self.clone_icon = clone_icon;
        self
    }
}

/// Drives a [`Directory`] through one full clone.
pub struct CloneEngine<D> {
    directory: D,
    pacer: Pacer,
}

impl<D: Directory> CloneEngine<D> {
    /// Create an engine with the given pacing and cancellation token.
    pub fn new(directory: D, pacing: PacingConfig, cancel: CancellationToken) -> Self {
        Self {
            directory,
            pacer: Pacer::new(pacing, cancel),
        }
    }

    /// The directory this engine drives.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Run a clone.
    ///
    /// Only credential rejection, resolution failure and cancellation end the
    /// run with an error. Everything after resolution is downgraded to warnings
    /// and recorded in the returned report.
    pub async fn run(&self, request: &CloneRequest) -> Result<CloneReport, CloneError> {
        info!(source = %request.source, target = %request.target, "starting clone");

        if request.source == request.target {
            return Err(CloneError::Resolution {
                guild_id: request.target,
                reason: "source and target are the same guild".into(),
            });
        }

        let user = self.check_session().await?;
        let source = self.resolve(request.source).await?;
        let target = self.resolve(request.target).await?;
        info!(name = %source.name, "source guild");
        info!(name = %target.name, "target guild");

        let mut report = CloneReport::new(source.id, target.id);
        if let Some(user) = user {
            report.admin_warning = !self.check_admin(&target, user).await;
        }

        info!("starting the cloning process");
        let mut identity = IdentityMap::new();

        let phase = teardown(&self.directory, &self.pacer, &target).await?;
        if !phase.completed() || !phase.skipped.is_empty() {
            warn!("cleaning partially failed, cloning continues");
        }
        report.phases.push(phase);

        let phase = replicate_roles(&self.directory, &self.pacer, &source, &target, &mut identity).await?;
        Self::finish(&mut report, phase);

        let phase = replicate_channels(&self.directory, &self.pacer, &source, &target, &mut identity).await?;
        Self::finish(&mut report, phase);

        let phase = replicate_emoji(&self.directory, &self.pacer, &source, &target).await?;
        Self::finish(&mut report, phase);

        let phase = replicate_branding(
            &self.directory,
            &self.pacer,
            &source,
            &target,
            request.clone_icon,
        )
        .await?;
        Self::finish(&mut report, phase);

        report.roles_mapped = identity.role_count();
        report.categories_mapped = identity.category_count();
        info!("{}", report.one_line_summary());
        Ok(report)
    }

    fn finish(report: &mut CloneReport, phase: PhaseReport) {
        if let Some(reason) = &phase.aborted {
            warn!(phase = %phase.phase, "phase stopped early: {reason}");
        } else if !phase.skipped.is_empty() {
            warn!(phase = %phase.phase, skipped = phase.skipped.len(), "phase finished with skipped entities");
        } else {
            info!(phase = %phase.phase, "phase finished");
        }
        report.phases.push(phase);
    }

    /// Confirm the credentials work. A transport failure here is not a
    /// credential problem, so it only drops the admin check.
    async fn check_session(&self) -> Result<Option<UserId>, CloneError> {
        match self.directory.current_user().await {
            Ok(user) => Ok(Some(user)),
            Err(DirectoryError::Unauthorized { msg }) => Err(CloneError::Credential { msg }),
            Err(err) => {
                warn!("could not verify the session: {err}");
                Ok(None)
            }
        }
    }

    /// Fetch a guild, falling back to the accessible listing when a direct
    /// fetch is forbidden.
    async fn resolve(&self, id: GuildId) -> Result<Workspace, CloneError> {
        let result = match self.directory.fetch_workspace(id).await {
            Err(DirectoryError::Forbidden { msg }) => self.resolve_from_listing(id, msg).await,
            other => other,
        };
        match Outcome::from_result(Step::ResolveWorkspace, result) {
            Outcome::Done(workspace) => Ok(workspace),
            Outcome::Skipped(failure) | Outcome::PhaseAborted(failure) | Outcome::Fatal(failure) => {
                failure.log(&format!("guild {id}"));
                let reason = match failure.error {
                    DirectoryError::NotFound { .. } => "guild not found".to_string(),
                    DirectoryError::Forbidden { .. } => "no access to guild".to_string(),
                    other => other.to_string(),
                };
                Err(CloneError::Resolution {
                    guild_id: id,
                    reason,
                })
            }
        }
    }

    async fn resolve_from_listing(
        &self,
        id: GuildId,
        forbidden: String,
    ) -> crate::directory::Result<Workspace> {
        let listing = self.directory.accessible_workspaces().await?;
        match listing.iter().find(|summary| summary.id == id) {
            Some(summary) => self.directory.fetch_workspace_from_listing(summary).await,
            None => Err(DirectoryError::Forbidden { msg: forbidden }),
        }
    }

    /// Advisory check that the session is an administrator of the target.
    /// Returns false only when the check ran and found the bit missing.
    async fn check_admin(&self, target: &Workspace, user: UserId) -> bool {
        match self.directory.fetch_member(target.id, user).await {
            Ok(member) => {
                let admin = target
                    .member_permissions(&member)
                    .contains(Permissions::ADMINISTRATOR);
                if !admin {
                    warn!("you may not have administrator permissions on the target guild");
                    info!("cloning will continue but some operations may fail");
                }
                admin
            }
            Err(err) => {
                info!("could not check permissions ({err}), cloning will continue");
                true
            }
        }
    }
}
