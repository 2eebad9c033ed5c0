//! Discord delivery: one content line plus a rich embed per announcement.

use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{CreateEmbed, CreateEmbedAuthor, CreateMessage};
use serenity::http::Http;
use serenity::model::Timestamp;
use serenity::model::colour::Colour;
use serenity::model::id::ChannelId;
use tracing::debug;
use uplink_platforms::Platform;

use super::{Announcement, Announcer};
use crate::{Error, Result};

/// Twitch brand purple.
const TWITCH_COLOUR: Colour = Colour(0x9146FF);
/// YouTube brand red.
const YOUTUBE_COLOUR: Colour = Colour(0xFF0000);

/// Sends announcements through the bot's HTTP client.
pub struct DiscordAnnouncer {
    http: Arc<Http>,
}

impl DiscordAnnouncer {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn platform_colour(platform: Platform) -> Colour {
        match platform {
            Platform::Twitch => TWITCH_COLOUR,
            Platform::Youtube => YOUTUBE_COLOUR,
        }
    }

    /// Assemble the message payload. Metadata the platform did not supply
    /// is simply left off the embed.
    fn build_message(announcement: &Announcement) -> CreateMessage {
        let mut embed = CreateEmbed::new()
            .author(CreateEmbedAuthor::new(&announcement.channel_name))
            .title(announcement.embed_title())
            .url(&announcement.url)
            .colour(Self::platform_colour(announcement.platform));

        if let Some(thumbnail) = &announcement.thumbnail_url {
            embed = embed.image(thumbnail);
        }
        if let Some(viewers) = announcement.viewer_count {
            embed = embed.field("Viewers", viewers.to_string(), true);
        }
        if let Some(started) = announcement.started_at
            && let Ok(timestamp) = Timestamp::from_unix_timestamp(started.timestamp())
        {
            embed = embed.timestamp(timestamp);
        }

        CreateMessage::new()
            .content(announcement.content())
            .embed(embed)
    }
}

#[async_trait]
impl Announcer for DiscordAnnouncer {
    async fn announce(&self, channel_id: &str, announcement: &Announcement) -> Result<()> {
        let destination = parse_channel_id(channel_id)?;
        destination
            .send_message(&self.http, Self::build_message(announcement))
            .await?;
        debug!(
            "Announcement for {} delivered to channel {}",
            announcement.channel_name, destination
        );
        Ok(())
    }
}

/// Parse a stored destination into a Discord channel id.
fn parse_channel_id(raw: &str) -> Result<ChannelId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
        .ok_or_else(|| Error::validation(format!("Invalid announcement channel id {raw:?}")))
}
