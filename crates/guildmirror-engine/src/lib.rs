#![warn(missing_docs)]

//! guildmirror replication engine: rebuilds the role, channel, emoji and branding
//! graph of one guild on top of another through a remote [`Directory`].

pub mod branding;
pub mod channels;
pub mod directory;
pub mod emoji;
pub mod engine;
pub mod error;
pub mod id;
pub mod identity;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod model;
pub mod outcome;
pub mod overwrite;
pub mod pacing;
pub mod permissions;
pub mod report;
pub mod roles;
pub mod teardown;

pub use directory::Directory;
pub use engine::{CloneEngine, CloneRequest};
pub use error::{Cancelled, CloneError, DirectoryError};
pub use id::{ChannelId, EmojiId, GuildId, RoleId, UserId};
pub use identity::IdentityMap;
pub use pacing::{PaceKind, Pacer, PacingConfig};
pub use permissions::Permissions;
pub use report::{CloneReport, Phase, PhaseReport};
