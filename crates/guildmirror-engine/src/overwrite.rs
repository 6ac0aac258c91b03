//! Rewrites permission overwrites from source identities to target identities.

use crate::id::{RoleId, UserId};
use crate::identity::IdentityMap;
use crate::model::{OverwriteSubject, PermissionOverwrite, Workspace};
use std::collections::HashSet;

/// Everything the translator needs to know about both sides.
#[derive(Debug, Clone, Copy)]
pub struct TranslationContext<'a> {
    /// Role translations recorded so far.
    pub identity: &'a IdentityMap,
    /// Members currently present in the target guild.
    pub target_members: &'a HashSet<UserId>,
    /// The target guild's default role.
    pub target_default_role: RoleId,
    /// The source guild's default role, so a role subject naming it is
    /// recognised as the default-role sentinel.
    pub source_default_role: RoleId,
}

impl<'a> TranslationContext<'a> {
    /// Build a context from the two snapshots and the current identity map.
    pub fn new(identity: &'a IdentityMap, source: &Workspace, target: &'a Workspace) -> Self {
        Self {
            identity,
            target_members: &target.members,
            target_default_role: target.default_role,
            source_default_role: source.default_role,
        }
    }

    fn translate_subject(&self, subject: OverwriteSubject) -> Option<OverwriteSubject> {
        match subject {
            OverwriteSubject::DefaultRole => Some(OverwriteSubject::Role(self.target_default_role)),
            OverwriteSubject::Role(id) if id == self.source_default_role => {
                Some(OverwriteSubject::Role(self.target_default_role))
            }
            OverwriteSubject::Role(id) => self.identity.role(id).map(OverwriteSubject::Role),
            OverwriteSubject::Member(user) if self.target_members.contains(&user) => {
                Some(OverwriteSubject::Member(user))
            }
            OverwriteSubject::Member(_) => None,
        }
    }
}

/// Translate a set of overwrites into target identities.
///
/// Entries whose subject has no counterpart in the target are dropped without
/// logging; members absent from one of the two guilds are the common case.
/// Allow and deny bits are carried over unchanged and input order is kept.
pub fn translate_overwrites(
    overwrites: &[PermissionOverwrite],
    ctx: &TranslationContext<'_>,
) -> Vec<PermissionOverwrite> {
    overwrites
        .iter()
        .filter_map(|ow| {
            ctx.translate_subject(ow.subject)
                .map(|subject| PermissionOverwrite::new(subject, ow.allow, ow.deny))
        })
        .collect()
}
