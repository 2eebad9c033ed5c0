//! Announcement formatting and delivery.
//!
//! The watcher hands a finished [`Announcement`] to an [`Announcer`]; the
//! Discord implementation lives in [`discord`]. Delivery failure leaves
//! announcement state untouched so the next cycle retries.

mod discord;

pub use discord::DiscordAnnouncer;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uplink_platforms::{LiveStatus, Platform};

use crate::Result;
use crate::database::models::TrackedStream;

/// Everything needed to format one live announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub platform: Platform,
    pub channel_name: String,
    /// Stream title; may be empty when the platform omitted it.
    pub title: String,
    /// Watch URL.
    pub url: String,
    pub started_at: Option<DateTime<Utc>>,
    pub viewer_count: Option<u64>,
    pub thumbnail_url: Option<String>,
    /// Operator override for the content line.
    pub custom_message: Option<String>,
}

impl Announcement {
    /// Build from a liveness observation; `None` when the status is offline.
    pub fn from_status(
        stream: &TrackedStream,
        platform: Platform,
        status: &LiveStatus,
    ) -> Option<Self> {
        match status {
            LiveStatus::Live {
                title,
                url,
                started_at,
                viewer_count,
                thumbnail_url,
            } => Some(Self {
                platform,
                channel_name: stream.channel_name.clone(),
                title: title.clone(),
                url: url.clone(),
                started_at: *started_at,
                viewer_count: *viewer_count,
                thumbnail_url: thumbnail_url.clone(),
                custom_message: stream.custom_message.clone(),
            }),
            LiveStatus::Offline => None,
        }
    }

    /// Content line above the embed.
    pub fn content(&self) -> String {
        match &self.custom_message {
            Some(message) => message.clone(),
            None => format!(
                "{} is now live on {}!",
                self.channel_name,
                self.platform.display_name()
            ),
        }
    }

    /// Embed title, with a fallback when the stream title is empty.
    pub fn embed_title(&self) -> String {
        if self.title.is_empty() {
            format!("{} is live", self.channel_name)
        } else {
            self.title.clone()
        }
    }
}

/// Delivers announcements to a destination channel.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, channel_id: &str, announcement: &Announcement) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announcement() -> Announcement {
        Announcement {
            platform: Platform::Twitch,
            channel_name: "grimm".to_string(),
            title: "best boxes".to_string(),
            url: "https://twitch.tv/grimm".to_string(),
            started_at: None,
            viewer_count: None,
            thumbnail_url: None,
            custom_message: None,
        }
    }

    #[test]
    fn test_default_content_names_channel_and_platform() {
        assert_eq!(announcement().content(), "grimm is now live on Twitch!");
    }

    #[test]
    fn test_custom_message_overrides_content() {
        let mut a = announcement();
        a.custom_message = Some("Box opening time, get in here".to_string());
        assert_eq!(a.content(), "Box opening time, get in here");
    }

    #[test]
    fn test_embed_title_falls_back_when_empty() {
        let mut a = announcement();
        a.title = String::new();
        assert_eq!(a.embed_title(), "grimm is live");
    }

    #[test]
    fn test_from_status_carries_stream_fields() {
        let stream = TrackedStream::new("guild-1", Platform::Twitch, "grimm")
            .with_custom_message("go watch");
        let status = LiveStatus::Live {
            title: "best boxes".to_string(),
            url: "https://twitch.tv/grimm".to_string(),
            started_at: None,
            viewer_count: Some(12),
            thumbnail_url: None,
        };

        let a = Announcement::from_status(&stream, Platform::Twitch, &status).unwrap();
        assert_eq!(a.channel_name, "grimm");
        assert_eq!(a.custom_message.as_deref(), Some("go watch"));
        assert_eq!(a.viewer_count, Some(12));

        assert!(Announcement::from_status(&stream, Platform::Twitch, &LiveStatus::Offline).is_none());
    }
}
