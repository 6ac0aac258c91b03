//! Source-to-target identity translation for one clone run.
//!
//! Roles and categories are minted fresh on the target, so every reference to
//! them (overwrites, channel parents) has to be rewritten through this table.
//! Entries are only ever added. A missing entry means the source entity was
//! not replicated and the reference is simply dropped downstream.

use crate::id::{ChannelId, RoleId};
use std::collections::HashMap;

/// A single role translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleMapping {
    /// Role id in the source guild.
    pub source: RoleId,
    /// Role id of the copy in the target guild.
    pub target: RoleId,
}

/// A single category translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMapping {
    /// Category id in the source guild.
    pub source: ChannelId,
    /// Category id of the copy in the target guild.
    pub target: ChannelId,
}

/// Run-scoped translation table.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    roles: HashMap<RoleId, RoleId>,
    categories: HashMap<ChannelId, ChannelId>,
}

impl IdentityMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a replicated role.
    ///
    /// Returns false, keeping the first entry, if the source role was already
    /// recorded.
    pub fn record_role(&mut self, source: RoleId, target: RoleId) -> bool {
        if self.roles.contains_key(&source) {
            return false;
        }
        self.roles.insert(source, target);
        true
    }

    /// Record a replicated category. Same first-write-wins rule as roles.
    pub fn record_category(&mut self, source: ChannelId, target: ChannelId) -> bool {
        if self.categories.contains_key(&source) {
            return false;
        }
        self.categories.insert(source, target);
        true
    }

    /// Translate a source role id.
    pub fn role(&self, source: RoleId) -> Option<RoleId> {
        self.roles.get(&source).copied()
    }

    /// Translate a source category id.
    pub fn category(&self, source: ChannelId) -> Option<ChannelId> {
        self.categories.get(&source).copied()
    }

    /// Number of translated roles.
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Number of translated categories.
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// All role translations, in no particular order.
    pub fn role_mappings(&self) -> Vec<RoleMapping> {
        self.roles
            .iter()
            .map(|(&source, &target)| RoleMapping { source, target })
            .collect()
    }

    /// All category translations, in no particular order.
    pub fn category_mappings(&self) -> Vec<CategoryMapping> {
        self.categories
            .iter()
            .map(|(&source, &target)| CategoryMapping { source, target })
            .collect()
    }

    /// Returns true if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.categories.is_empty()
    }
}
