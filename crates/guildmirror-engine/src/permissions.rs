//! Guild permission bit set.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

bitflags::bitflags! {
    /// Permission bits as used by roles and channel overwrites.
    ///
    /// Unknown bits are retained so a copy never silently drops permissions the
    /// service added after this list was written.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permissions: u64 {
        /// Create instant invites.
        const CREATE_INSTANT_INVITE     = 1 << 0;
        /// Kick members.
        const KICK_MEMBERS              = 1 << 1;
        /// Ban members.
        const BAN_MEMBERS               = 1 << 2;
        /// Every permission, bypassing overwrites.
        const ADMINISTRATOR             = 1 << 3;
        /// Manage channels.
        const MANAGE_CHANNELS           = 1 << 4;
        /// Manage the guild itself.
        const MANAGE_GUILD              = 1 << 5;
        /// Add reactions.
        const ADD_REACTIONS             = 1 << 6;
        /// View the audit log.
        const VIEW_AUDIT_LOG            = 1 << 7;
        /// Priority speaker in voice.
        const PRIORITY_SPEAKER          = 1 << 8;
        /// Go live.
        const STREAM                    = 1 << 9;
        /// See a channel.
        const VIEW_CHANNEL              = 1 << 10;
        /// Send messages.
        const SEND_MESSAGES             = 1 << 11;
        /// Send text-to-speech messages.
        const SEND_TTS_MESSAGES         = 1 << 12;
        /// Manage messages of others.
        const MANAGE_MESSAGES           = 1 << 13;
        /// Embed links.
        const EMBED_LINKS               = 1 << 14;
        /// Attach files.
        const ATTACH_FILES              = 1 << 15;
        /// Read message history.
        const READ_MESSAGE_HISTORY      = 1 << 16;
        /// Mention everyone.
        const MENTION_EVERYONE          = 1 << 17;
        /// Use emoji from other guilds.
        const USE_EXTERNAL_EMOJIS       = 1 << 18;
        /// View guild insights.
        const VIEW_GUILD_INSIGHTS       = 1 << 19;
        /// Connect to voice.
        const CONNECT                   = 1 << 20;
        /// Speak in voice.
        const SPEAK                     = 1 << 21;
        /// Mute members.
        const MUTE_MEMBERS              = 1 << 22;
        /// Deafen members.
        const DEAFEN_MEMBERS            = 1 << 23;
        /// Move members between voice channels.
        const MOVE_MEMBERS              = 1 << 24;
        /// Use voice activity detection.
        const USE_VAD                   = 1 << 25;
        /// Change own nickname.
        const CHANGE_NICKNAME           = 1 << 26;
        /// Change other nicknames.
        const MANAGE_NICKNAMES          = 1 << 27;
        /// Manage roles below own top role.
        const MANAGE_ROLES              = 1 << 28;
        /// Manage webhooks.
        const MANAGE_WEBHOOKS           = 1 << 29;
        /// Manage emoji, stickers and soundboard sounds.
        const MANAGE_GUILD_EXPRESSIONS  = 1 << 30;
        /// Use application commands.
        const USE_APPLICATION_COMMANDS  = 1 << 31;
        /// Request to speak in stage channels.
        const REQUEST_TO_SPEAK          = 1 << 32;
        /// Manage scheduled events.
        const MANAGE_EVENTS             = 1 << 33;
        /// Manage threads.
        const MANAGE_THREADS            = 1 << 34;
        /// Create public threads.
        const CREATE_PUBLIC_THREADS     = 1 << 35;
        /// Create private threads.
        const CREATE_PRIVATE_THREADS    = 1 << 36;
        /// Use stickers from other guilds.
        const USE_EXTERNAL_STICKERS     = 1 << 37;
        /// Send messages in threads.
        const SEND_MESSAGES_IN_THREADS  = 1 << 38;
        /// Use embedded activities.
        const USE_EMBEDDED_ACTIVITIES   = 1 << 39;
        /// Time out members.
        const MODERATE_MEMBERS          = 1 << 40;
    }
}

impl Permissions {
    /// Builds a set from raw bits, keeping bits this crate does not name.
    pub const fn from_raw(bits: u64) -> Self {
        Self::from_bits_retain(bits)
    }
}

// The service encodes permission sets as decimal strings.
impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.bits())
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PermissionsVisitor;

        impl<'de> Visitor<'de> for PermissionsVisitor {
            type Value = Permissions;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a permission bit set as a decimal string or integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Permissions, E> {
                Ok(Permissions::from_raw(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Permissions, E> {
                v.parse::<u64>()
                    .map(Permissions::from_raw)
                    .map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PermissionsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_bits_retained() {
        let perms = Permissions::from_raw(1 << 60 | 1 << 3);
        assert!(perms.contains(Permissions::ADMINISTRATOR));
        assert_eq!(perms.bits(), 1 << 60 | 1 << 3);
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let perms = Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES;
        assert_eq!(serde_json::to_string(&perms).unwrap(), "\"3072\"");
    }

    #[test]
    fn test_deserializes_string_or_number() {
        let a: Permissions = serde_json::from_str("\"1024\"").unwrap();
        let b: Permissions = serde_json::from_str("1024").unwrap();
        assert_eq!(a, Permissions::VIEW_CHANNEL);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_non_numeric_string() {
        assert!(serde_json::from_str::<Permissions>("\"lots\"").is_err());
    }
}
