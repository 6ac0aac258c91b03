//! Asset URLs on the media CDN.

use guildmirror_engine::model::AssetRef;
use guildmirror_engine::{EmojiId, GuildId};

/// Default CDN base URL.
pub const DEFAULT_CDN_BASE: &str = "https://cdn.discordapp.com";

/// Builds asset references from image hashes.
#[derive(Debug, Clone)]
pub struct Cdn {
    base: String,
}

impl Default for Cdn {
    fn default() -> Self {
        Self::new(DEFAULT_CDN_BASE)
    }
}

impl Cdn {
    /// A CDN rooted at `base` (no trailing slash needed).
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// Guild icon. Animated hashes (`a_` prefix) resolve to GIF.
    pub fn guild_icon(&self, guild: GuildId, hash: &str) -> AssetRef {
        AssetRef::new(format!("{}/icons/{guild}/{hash}.{}", self.base, extension(hash)))
    }

    /// Guild banner.
    pub fn guild_banner(&self, guild: GuildId, hash: &str) -> AssetRef {
        AssetRef::new(format!("{}/banners/{guild}/{hash}.{}", self.base, extension(hash)))
    }

    /// Custom emoji image.
    pub fn emoji(&self, emoji: EmojiId, animated: bool) -> AssetRef {
        let ext = if animated { "gif" } else { "png" };
        AssetRef::new(format!("{}/emojis/{emoji}.{ext}", self.base))
    }
}

fn extension(hash: &str) -> &'static str {
    if hash.starts_with("a_") {
        "gif"
    } else {
        "png"
    }
}
