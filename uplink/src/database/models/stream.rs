//! Tracked stream database model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uplink_platforms::Platform;

use crate::database::time::now_ms;

/// One tracked (guild, platform, channel) announcement target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TrackedStream {
    /// Owning guild.
    pub guild_id: String,
    /// Platform identifier (`twitch` or `youtube`), parsed at the edge so a
    /// corrupt row fails only its own tuple.
    pub platform: String,
    /// Platform-specific channel identifier.
    pub channel_name: String,
    /// Destination channel for announcements; unset until configured.
    pub announce_channel_id: Option<String>,
    /// Operator-supplied override for the announcement content line.
    pub custom_message: Option<String>,
    /// Start of the live session last announced (epoch ms); NULL while the
    /// channel is believed offline.
    pub last_announced_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TrackedStream {
    /// Fresh record for an operator-configured tuple.
    pub fn new(
        guild_id: impl Into<String>,
        platform: Platform,
        channel_name: impl Into<String>,
    ) -> Self {
        let now = now_ms();
        Self {
            guild_id: guild_id.into(),
            platform: platform.as_str().to_string(),
            channel_name: channel_name.into(),
            announce_channel_id: None,
            custom_message: None,
            last_announced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_announce_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.announce_channel_id = Some(channel_id.into());
        self
    }

    pub fn with_custom_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_unannounced() {
        let stream = TrackedStream::new("guild-1", Platform::Twitch, "grimm");
        assert_eq!(stream.platform, "twitch");
        assert!(stream.announce_channel_id.is_none());
        assert!(stream.custom_message.is_none());
        assert!(stream.last_announced_at.is_none());
        assert_eq!(stream.created_at, stream.updated_at);
    }

    #[test]
    fn test_builder_setters() {
        let stream = TrackedStream::new("guild-1", Platform::Youtube, "@handle")
            .with_announce_channel("123456")
            .with_custom_message("we are live");
        assert_eq!(stream.announce_channel_id.as_deref(), Some("123456"));
        assert_eq!(stream.custom_message.as_deref(), Some("we are live"));
    }
}
