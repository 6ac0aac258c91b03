//! Phase and run reports.
//!
//! Every phase returns a [`PhaseReport`]; the orchestrator collects them into a
//! [`CloneReport`] for the operator.

use crate::id::GuildId;
use crate::outcome::{Failure, FailureClass, Step};
use std::fmt;

/// One of the five replication phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Deleting the target's existing graph.
    Teardown,
    /// Creating and ordering roles.
    Roles,
    /// Creating categories and channels.
    Channels,
    /// Uploading emoji.
    Emoji,
    /// Copying name, icon and banner.
    Branding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Teardown => "teardown",
            Phase::Roles => "roles",
            Phase::Channels => "channels",
            Phase::Emoji => "emoji",
            Phase::Branding => "branding",
        };
        f.write_str(s)
    }
}

/// An entity that was skipped, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRecord {
    /// Human-readable entity description, e.g. `role "Mod"`.
    pub entity: String,
    /// Operation that failed.
    pub step: Step,
    /// Failure class.
    pub class: FailureClass,
    /// Error text.
    pub reason: String,
}

/// Outcome of one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseReport {
    /// Which phase.
    pub phase: Phase,
    /// Operations attempted.
    pub attempted: usize,
    /// Operations that succeeded.
    pub succeeded: usize,
    /// Skipped entities.
    pub skipped: Vec<SkipRecord>,
    /// Why the phase stopped early, if it did.
    pub aborted: Option<String>,
    /// Work items left untouched after an early stop.
    pub unattempted: usize,
    /// Informational notes (options that disabled a step, etc.).
    pub notes: Vec<String>,
}

impl PhaseReport {
    /// An empty report for a phase.
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            attempted: 0,
            succeeded: 0,
            skipped: Vec::new(),
            aborted: None,
            unattempted: 0,
            notes: Vec::new(),
        }
    }

    /// Count a successful operation.
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    /// Count a failed operation and remember the entity.
    pub fn record_skip(&mut self, entity: impl Into<String>, failure: &Failure) {
        self.attempted += 1;
        self.skipped.push(SkipRecord {
            entity: entity.into(),
            step: failure.step,
            class: failure.class,
            reason: failure.error.to_string(),
        });
    }

    /// Mark the phase as stopped early with `unattempted` items left over.
    pub fn abort(&mut self, reason: impl Into<String>, unattempted: usize) {
        self.aborted = Some(reason.into());
        self.unattempted = unattempted;
    }

    /// Attach an informational note.
    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Returns true if the phase ran to the end of its work list.
    pub fn completed(&self) -> bool {
        self.aborted.is_none()
    }

    /// Returns true if every attempted operation succeeded and nothing aborted.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.completed()
    }

    /// One-line summary.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{}: {}/{} ok, {} skipped",
            self.phase,
            self.succeeded,
            self.attempted,
            self.skipped.len()
        );
        if let Some(reason) = &self.aborted {
            line.push_str(&format!(" (stopped: {reason}, {} left)", self.unattempted));
        }
        line
    }
}

/// Outcome of a whole clone run that got past workspace resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneReport {
    /// Source guild.
    pub source: GuildId,
    /// Target guild.
    pub target: GuildId,
    /// Per-phase reports in execution order.
    pub phases: Vec<PhaseReport>,
    /// Roles recorded in the identity map.
    pub roles_mapped: usize,
    /// Categories recorded in the identity map.
    pub categories_mapped: usize,
    /// Whether the advisory admin check raised a warning.
    pub admin_warning: bool,
}

impl CloneReport {
    /// Create a report with no phases yet.
    pub fn new(source: GuildId, target: GuildId) -> Self {
        Self {
            source,
            target,
            phases: Vec::new(),
            roles_mapped: 0,
            categories_mapped: 0,
            admin_warning: false,
        }
    }

    /// The report of one phase, if it ran.
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Total skipped entities across phases.
    pub fn total_skipped(&self) -> usize {
        self.phases.iter().map(|p| p.skipped.len()).sum()
    }

    /// Returns true if any phase skipped an entity or stopped early.
    pub fn is_degraded(&self) -> bool {
        self.phases.iter().any(|p| !p.is_clean())
    }

    /// One-line summary for the operator.
    pub fn one_line_summary(&self) -> String {
        format!(
            "{} -> {}: {} phases | {} roles mapped | {} categories mapped | {} skipped",
            self.source,
            self.target,
            self.phases.len(),
            self.roles_mapped,
            self.categories_mapped,
            self.total_skipped()
        )
    }
}
