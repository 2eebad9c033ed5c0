//! YouTube liveness lookups via the Data API v3.
//!
//! Two requests per check: resolve the operator-supplied handle to a stable
//! channel ID, then search that channel for an active live broadcast. Raw
//! channel IDs skip the first step. The live search result carries no
//! session start time, so [`LiveStatus::Live::started_at`] is always `None`
//! for this platform.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::error::ProbeError;
use crate::status::LiveStatus;

const CHANNELS_URL: &str = "https://www.googleapis.com/youtube/v3/channels";
const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?youtube\.com/(channel/|@)([A-Za-z0-9_\-.]+)")
        .expect("Invalid YouTube URL regex")
});

/// Data API credentials.
#[derive(Debug, Clone)]
pub struct YouTubeCredentials {
    /// API key, sent as the `key` query parameter.
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChannelListResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
struct ChannelItem {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchSnippet {
    title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: Option<String>,
}

impl Thumbnails {
    fn best(self) -> Option<String> {
        [self.high, self.medium, self.default]
            .into_iter()
            .flatten()
            .find_map(|thumbnail| thumbnail.url)
    }
}

/// Reduce operator input (channel URL, handle, or raw channel ID) to the
/// stored channel identifier. Handles are kept in `@handle` form.
pub fn normalize_channel(input: &str) -> Result<String, ProbeError> {
    let trimmed = input.trim();
    if let Some(captures) = URL_REGEX.captures(trimmed) {
        let name = captures[2].to_string();
        return if &captures[1] == "channel/" {
            Ok(name)
        } else {
            Ok(format!("@{name}"))
        };
    }
    if is_channel_id(trimmed) {
        return Ok(trimmed.to_string());
    }
    let handle = trimmed.strip_prefix('@').unwrap_or(trimmed);
    if !handle.is_empty()
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Ok(format!("@{handle}"));
    }
    Err(ProbeError::InvalidChannel(input.to_string()))
}

/// Stable channel IDs are 24 characters beginning with `UC`.
fn is_channel_id(value: &str) -> bool {
    value.len() == 24
        && value.starts_with("UC")
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
}

/// Look up the current live status of a handle or channel ID.
pub async fn fetch_live_status(
    client: &reqwest::Client,
    credentials: &YouTubeCredentials,
    channel: &str,
) -> Result<LiveStatus, ProbeError> {
    let channel_id = resolve_channel_id(client, credentials, channel).await?;

    let response = client
        .get(SEARCH_URL)
        .query(&[
            ("part", "snippet"),
            ("channelId", channel_id.as_str()),
            ("eventType", "live"),
            ("type", "video"),
            ("maxResults", "1"),
            ("key", credentials.api_key.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProbeError::Api {
            platform: "youtube",
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let parsed: SearchResponse = serde_json::from_str(&body)?;
    Ok(status_from_search(parsed))
}

async fn resolve_channel_id(
    client: &reqwest::Client,
    credentials: &YouTubeCredentials,
    channel: &str,
) -> Result<String, ProbeError> {
    if is_channel_id(channel) {
        return Ok(channel.to_string());
    }

    let response = client
        .get(CHANNELS_URL)
        .query(&[
            ("part", "id"),
            ("forHandle", channel),
            ("maxResults", "1"),
            ("key", credentials.api_key.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProbeError::Api {
            platform: "youtube",
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let parsed: ChannelListResponse = serde_json::from_str(&body)?;
    parsed
        .items
        .into_iter()
        .find_map(|item| item.id)
        .ok_or_else(|| ProbeError::ChannelNotFound(channel.to_string()))
}

fn status_from_search(response: SearchResponse) -> LiveStatus {
    let Some(item) = response.items.into_iter().next() else {
        return LiveStatus::Offline;
    };
    let Some(video_id) = item.id.and_then(|id| id.video_id) else {
        warn!("Live search entry without a video id, treating as offline");
        return LiveStatus::Offline;
    };

    let snippet = item.snippet.unwrap_or_default();
    LiveStatus::Live {
        title: snippet.title.unwrap_or_default(),
        url: format!("https://www.youtube.com/watch?v={video_id}"),
        started_at: None,
        viewer_count: None,
        thumbnail_url: snippet.thumbnails.and_then(Thumbnails::best),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search(value: serde_json::Value) -> SearchResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_keeps_channel_ids() {
        let id = "UC-lHJZR3Gqxm24_Vd_AJ5Yw";
        assert_eq!(normalize_channel(id).unwrap(), id);
    }

    #[test]
    fn test_normalize_canonicalizes_handles() {
        assert_eq!(normalize_channel("LinusTechTips").unwrap(), "@LinusTechTips");
        assert_eq!(normalize_channel("@LinusTechTips").unwrap(), "@LinusTechTips");
    }

    #[test]
    fn test_normalize_accepts_urls() {
        assert_eq!(
            normalize_channel("https://www.youtube.com/@veritasium").unwrap(),
            "@veritasium"
        );
        assert_eq!(
            normalize_channel("youtube.com/channel/UC-lHJZR3Gqxm24_Vd_AJ5Yw").unwrap(),
            "UC-lHJZR3Gqxm24_Vd_AJ5Yw"
        );
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_channel("").is_err());
        assert!(normalize_channel("not a handle").is_err());
    }

    #[test]
    fn test_channel_id_detection() {
        assert!(is_channel_id("UC-lHJZR3Gqxm24_Vd_AJ5Yw"));
        assert!(!is_channel_id("@handle"));
        assert!(!is_channel_id("UCshort"));
    }

    #[test]
    fn test_no_items_is_offline() {
        assert_eq!(status_from_search(search(json!({ "items": [] }))), LiveStatus::Offline);
        assert_eq!(status_from_search(search(json!({}))), LiveStatus::Offline);
    }

    #[test]
    fn test_missing_video_id_is_offline() {
        let payload = json!({ "items": [{ "snippet": { "title": "live now" } }] });
        assert_eq!(status_from_search(search(payload)), LiveStatus::Offline);
    }

    #[test]
    fn test_live_broadcast_maps_metadata() {
        let payload = json!({
            "items": [{
                "id": { "videoId": "dQw4w9WgXcQ" },
                "snippet": {
                    "title": "24h charity stream",
                    "thumbnails": {
                        "high": { "url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault_live.jpg" }
                    }
                }
            }]
        });

        match status_from_search(search(payload)) {
            LiveStatus::Live {
                title,
                url,
                started_at,
                viewer_count,
                thumbnail_url,
            } => {
                assert_eq!(title, "24h charity stream");
                assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
                assert!(started_at.is_none());
                assert!(viewer_count.is_none());
                assert_eq!(
                    thumbnail_url.unwrap(),
                    "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault_live.jpg"
                );
            }
            other => panic!("expected live status, got {other:?}"),
        }
    }

    #[test]
    fn test_thumbnail_fallback_order() {
        let thumbnails: Thumbnails = serde_json::from_value(json!({
            "medium": { "url": "medium-url" },
            "default": { "url": "default-url" }
        }))
        .unwrap();
        assert_eq!(thumbnails.best().unwrap(), "medium-url");
    }
}
