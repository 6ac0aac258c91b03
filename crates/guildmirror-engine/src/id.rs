//! Typed snowflake identifiers.
//!
//! Every entity on the remote service is named by a 64-bit snowflake. The wire
//! format carries them as decimal strings, so serde goes through `Display` and
//! `FromStr` rather than the integer representation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                $name(raw)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

snowflake_id!(
    /// Identifier of a guild (workspace).
    GuildId
);
snowflake_id!(
    /// Identifier of a role.
    RoleId
);
snowflake_id!(
    /// Identifier of a channel or category; both share one id space.
    ChannelId
);
snowflake_id!(
    /// Identifier of a custom emoji.
    EmojiId
);
snowflake_id!(
    /// Identifier of a user or guild member.
    UserId
);

impl GuildId {
    /// The id of the guild's default role, which always equals the guild id.
    pub const fn default_role(self) -> RoleId {
        RoleId(self.0)
    }
}
