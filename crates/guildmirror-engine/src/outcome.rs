//! Typed per-operation outcomes and the failure policy table.
//!
//! Every directory call the phases make is folded into an [`Outcome`]. The
//! failure class comes from the error, the action comes from [`policy`], and
//! the phase loop only ever matches on the outcome.

use crate::error::DirectoryError;
use std::fmt;
use tracing::{error, warn, Level};

/// Coarse classification of a directory error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The session lacks rights for this entity.
    PermissionDenied,
    /// Rate limit or other error response from the service.
    Service,
    /// The target guild has no emoji slots left.
    CapacityExhausted,
    /// Anything else: transport failures, undecodable responses.
    Unexpected,
}

impl FailureClass {
    /// Classify a directory error.
    pub fn of(err: &DirectoryError) -> Self {
        match err {
            DirectoryError::Forbidden { .. } => FailureClass::PermissionDenied,
            DirectoryError::EmojiCapacityExhausted => FailureClass::CapacityExhausted,
            DirectoryError::NotFound { .. }
            | DirectoryError::RateLimited { .. }
            | DirectoryError::AssetStatus { .. }
            | DirectoryError::Service { .. } => FailureClass::Service,
            DirectoryError::Unauthorized { .. }
            | DirectoryError::Transport { .. }
            | DirectoryError::Unexpected { .. } => FailureClass::Unexpected,
        }
    }
}

/// The operation an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Fetching a source or target guild.
    ResolveWorkspace,
    /// Deleting a channel.
    DeleteChannel,
    /// Deleting a category.
    DeleteCategory,
    /// Deleting a role.
    DeleteRole,
    /// Deleting an emoji.
    DeleteEmoji,
    /// Creating a role.
    CreateRole,
    /// The bulk role position assignment.
    ReorderRoles,
    /// Creating a category.
    CreateCategory,
    /// Creating a channel of any kind.
    CreateChannel,
    /// Downloading an emoji image.
    FetchEmojiImage,
    /// Uploading an emoji.
    UploadEmoji,
    /// Renaming the target guild.
    RenameWorkspace,
    /// Copying the guild icon.
    CopyIcon,
    /// Copying the guild banner.
    CopyBanner,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::ResolveWorkspace => "resolve guild",
            Step::DeleteChannel => "delete channel",
            Step::DeleteCategory => "delete category",
            Step::DeleteRole => "delete role",
            Step::DeleteEmoji => "delete emoji",
            Step::CreateRole => "create role",
            Step::ReorderRoles => "reorder roles",
            Step::CreateCategory => "create category",
            Step::CreateChannel => "create channel",
            Step::FetchEmojiImage => "download emoji",
            Step::UploadEmoji => "upload emoji",
            Step::RenameWorkspace => "rename guild",
            Step::CopyIcon => "copy icon",
            Step::CopyBanner => "copy banner",
        };
        f.write_str(s)
    }
}

/// What the caller does after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Skip this entity and carry on with the next one.
    Continue,
    /// Stop the current phase; later phases still run.
    AbortPhase,
    /// Stop the whole run.
    AbortRun,
}

/// The failure policy table.
pub fn policy(step: Step, class: FailureClass) -> Action {
    match (step, class) {
        (Step::ResolveWorkspace, _) => Action::AbortRun,
        (Step::UploadEmoji, FailureClass::CapacityExhausted) => Action::AbortPhase,
        // Without rights to rename, the asset edits would fail the same way.
        (Step::RenameWorkspace, _) => Action::AbortPhase,
        _ => Action::Continue,
    }
}

/// A failed operation, already classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// The operation that failed.
    pub step: Step,
    /// Classification of the error.
    pub class: FailureClass,
    /// The underlying error.
    pub error: DirectoryError,
}

impl Failure {
    /// Classify an error raised by `step`.
    pub fn new(step: Step, error: DirectoryError) -> Self {
        Self {
            step,
            class: FailureClass::of(&error),
            error,
        }
    }

    /// The policy action for this failure.
    pub fn action(&self) -> Action {
        policy(self.step, self.class)
    }

    /// Log the failure against the entity it concerns, at [`Failure::level`].
    pub fn log(&self, entity: &str) {
        if self.level() == Level::WARN {
            warn!(step = %self.step, entity, "{}: {}", self.label(), self.error);
        } else {
            error!(step = %self.step, entity, "{}: {}", self.label(), self.error);
        }
    }

    /// Severity this failure is logged at. Service and unexpected failures
    /// are errors, except a failed asset download.
    pub fn level(&self) -> Level {
        match (self.class, &self.error) {
            (_, DirectoryError::AssetStatus { .. })
            | (FailureClass::PermissionDenied, _)
            | (FailureClass::CapacityExhausted, _) => Level::WARN,
            _ => Level::ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match (self.class, &self.error) {
            (_, DirectoryError::AssetStatus { .. }) => "download failed",
            (FailureClass::PermissionDenied, _) => "no permission",
            (FailureClass::CapacityExhausted, _) => "capacity reached",
            (FailureClass::Service, _) => "service error",
            (FailureClass::Unexpected, _) => "unexpected error",
        }
    }
}

/// The typed result of one directory operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation succeeded.
    Done(T),
    /// The entity is skipped; the phase continues.
    Skipped(Failure),
    /// The phase stops here.
    PhaseAborted(Failure),
    /// The run stops here.
    Fatal(Failure),
}

impl<T> Outcome<T> {
    /// Fold a directory result through the policy table.
    pub fn from_result(step: Step, result: Result<T, DirectoryError>) -> Self {
        match result {
            Ok(value) => Outcome::Done(value),
            Err(err) => {
                let failure = Failure::new(step, err);
                match failure.action() {
                    Action::Continue => Outcome::Skipped(failure),
                    Action::AbortPhase => Outcome::PhaseAborted(failure),
                    Action::AbortRun => Outcome::Fatal(failure),
                }
            }
        }
    }

    /// Returns true for [`Outcome::Done`].
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forbidden() -> DirectoryError {
        DirectoryError::Forbidden {
            msg: "Missing Permissions".into(),
        }
    }

    fn service() -> DirectoryError {
        DirectoryError::Service {
            status: 500,
            code: None,
            msg: "oops".into(),
        }
    }

    mod classification {
        use super::*;

        #[test]
        fn test_classes() {
            assert_eq!(FailureClass::of(&forbidden()), FailureClass::PermissionDenied);
            assert_eq!(FailureClass::of(&service()), FailureClass::Service);
            assert_eq!(
                FailureClass::of(&DirectoryError::RateLimited { retry_after_ms: 10 }),
                FailureClass::Service
            );
            assert_eq!(
                FailureClass::of(&DirectoryError::EmojiCapacityExhausted),
                FailureClass::CapacityExhausted
            );
            assert_eq!(
                FailureClass::of(&DirectoryError::Transport { msg: "reset".into() }),
                FailureClass::Unexpected
            );
        }

        #[test]
        fn test_failed_download_logs_as_warning() {
            let download = Failure::new(Step::FetchEmojiImage, DirectoryError::AssetStatus { status: 404 });
            assert_eq!(download.class, FailureClass::Service);
            assert_eq!(download.level(), Level::WARN);
            assert_eq!(Failure::new(Step::CreateRole, forbidden()).level(), Level::WARN);
            assert_eq!(Failure::new(Step::CreateRole, service()).level(), Level::ERROR);
        }
    }

    mod policy_table {
        use super::*;

        #[test]
        fn test_entity_failures_continue() {
            for step in [
                Step::DeleteChannel,
                Step::DeleteCategory,
                Step::DeleteRole,
                Step::DeleteEmoji,
                Step::CreateRole,
                Step::ReorderRoles,
                Step::CreateCategory,
                Step::CreateChannel,
                Step::FetchEmojiImage,
                Step::CopyIcon,
                Step::CopyBanner,
            ] {
                for class in [
                    FailureClass::PermissionDenied,
                    FailureClass::Service,
                    FailureClass::Unexpected,
                ] {
                    assert_eq!(policy(step, class), Action::Continue, "{step} {class:?}");
                }
            }
        }

        #[test]
        fn test_emoji_capacity_aborts_phase() {
            assert_eq!(
                policy(Step::UploadEmoji, FailureClass::CapacityExhausted),
                Action::AbortPhase
            );
            assert_eq!(policy(Step::UploadEmoji, FailureClass::Service), Action::Continue);
        }

        #[test]
        fn test_resolution_aborts_run() {
            assert_eq!(
                policy(Step::ResolveWorkspace, FailureClass::Service),
                Action::AbortRun
            );
        }

        #[test]
        fn test_rename_failure_aborts_branding() {
            assert_eq!(
                policy(Step::RenameWorkspace, FailureClass::PermissionDenied),
                Action::AbortPhase
            );
        }
    }

    mod outcomes {
        use super::*;

        #[test]
        fn test_ok_is_done() {
            let outcome = Outcome::from_result(Step::CreateRole, Ok::<_, DirectoryError>(7));
            assert_eq!(outcome, Outcome::Done(7));
            assert!(outcome.is_done());
        }

        #[test]
        fn test_forbidden_create_is_skipped() {
            let outcome: Outcome<()> = Outcome::from_result(Step::CreateRole, Err(forbidden()));
            match outcome {
                Outcome::Skipped(f) => {
                    assert_eq!(f.class, FailureClass::PermissionDenied);
                    assert_eq!(f.step, Step::CreateRole);
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        #[test]
        fn test_capacity_upload_aborts_phase() {
            let outcome: Outcome<()> =
                Outcome::from_result(Step::UploadEmoji, Err(DirectoryError::EmojiCapacityExhausted));
            assert!(matches!(outcome, Outcome::PhaseAborted(_)));
        }

        #[test]
        fn test_resolution_failure_is_fatal() {
            let outcome: Outcome<()> = Outcome::from_result(
                Step::ResolveWorkspace,
                Err(DirectoryError::NotFound { what: "guild".into() }),
            );
            assert!(matches!(outcome, Outcome::Fatal(_)));
        }
    }
}
