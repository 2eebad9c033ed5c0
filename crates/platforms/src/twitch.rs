//! Twitch liveness lookups via the Helix API.
//!
//! A single `/streams` query keyed by login name: an entry of type `live`
//! means the channel is broadcasting, an empty list means offline.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::error::ProbeError;
use crate::status::LiveStatus;

const HELIX_STREAMS_URL: &str = "https://api.twitch.tv/helix/streams";

/// Rendered size for Helix preview images, which arrive as a template with
/// `{width}` and `{height}` placeholders.
const THUMBNAIL_WIDTH: u32 = 1280;
const THUMBNAIL_HEIGHT: u32 = 720;

pub static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?twitch\.tv/([A-Za-z0-9_]+)")
        .expect("Invalid Twitch URL regex")
});

/// Helix API credentials, minted out of band.
#[derive(Debug, Clone)]
pub struct TwitchCredentials {
    /// Application client ID, sent as the `Client-Id` header.
    pub client_id: String,
    /// OAuth bearer token.
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default)]
    data: Vec<HelixStream>,
}

/// One entry of the `/streams` payload. Every field is optional so a
/// degraded payload maps to "not live" instead of a decode error.
#[derive(Debug, Default, Deserialize)]
struct HelixStream {
    #[serde(rename = "type")]
    stream_type: Option<String>,
    user_login: Option<String>,
    title: Option<String>,
    viewer_count: Option<u64>,
    started_at: Option<String>,
    thumbnail_url: Option<String>,
}

/// Reduce operator input (bare login or a twitch.tv URL) to a login name.
pub fn normalize_channel(input: &str) -> Result<String, ProbeError> {
    let trimmed = input.trim();
    if let Some(captures) = URL_REGEX.captures(trimmed) {
        return Ok(captures[1].to_ascii_lowercase());
    }
    if !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Ok(trimmed.to_ascii_lowercase());
    }
    Err(ProbeError::InvalidChannel(input.to_string()))
}

/// Look up the current live status of a login name.
pub async fn fetch_live_status(
    client: &reqwest::Client,
    credentials: &TwitchCredentials,
    login: &str,
) -> Result<LiveStatus, ProbeError> {
    let response = client
        .get(HELIX_STREAMS_URL)
        .query(&[("user_login", login)])
        .header("Client-Id", &credentials.client_id)
        .bearer_auth(&credentials.access_token)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProbeError::Api {
            platform: "twitch",
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let parsed: StreamsResponse = serde_json::from_str(&body)?;
    Ok(status_from_response(parsed, login))
}

fn status_from_response(response: StreamsResponse, login: &str) -> LiveStatus {
    let Some(entry) = response.data.into_iter().next() else {
        return LiveStatus::Offline;
    };
    // Helix marks degraded entries with an empty type string.
    if entry.stream_type.as_deref() != Some("live") {
        return LiveStatus::Offline;
    }

    let login = entry.user_login.unwrap_or_else(|| login.to_string());
    LiveStatus::Live {
        title: entry.title.unwrap_or_default(),
        url: format!("https://twitch.tv/{login}"),
        started_at: entry.started_at.as_deref().and_then(parse_started_at),
        viewer_count: entry.viewer_count,
        thumbnail_url: entry.thumbnail_url.map(expand_thumbnail),
    }
}

fn parse_started_at(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            warn!("Unparseable Helix started_at {:?}: {}", raw, e);
            None
        }
    }
}

fn expand_thumbnail(template: String) -> String {
    template
        .replace("{width}", &THUMBNAIL_WIDTH.to_string())
        .replace("{height}", &THUMBNAIL_HEIGHT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> StreamsResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_accepts_bare_login() {
        assert_eq!(normalize_channel("Cirno_TV").unwrap(), "cirno_tv");
        assert_eq!(normalize_channel("  pokelawls ").unwrap(), "pokelawls");
    }

    #[test]
    fn test_normalize_accepts_urls() {
        assert_eq!(
            normalize_channel("https://www.twitch.tv/Cirno_TV").unwrap(),
            "cirno_tv"
        );
        assert_eq!(normalize_channel("twitch.tv/esl_csgo").unwrap(), "esl_csgo");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_channel("").is_err());
        assert!(normalize_channel("not a login").is_err());
        assert!(normalize_channel("https://youtube.com/@handle").is_err());
    }

    #[test]
    fn test_empty_data_is_offline() {
        let status = status_from_response(response(json!({ "data": [] })), "someone");
        assert_eq!(status, LiveStatus::Offline);
    }

    #[test]
    fn test_missing_data_key_is_offline() {
        let status = status_from_response(response(json!({})), "someone");
        assert_eq!(status, LiveStatus::Offline);
    }

    #[test]
    fn test_live_entry_maps_metadata() {
        let payload = json!({
            "data": [{
                "id": "40952121085",
                "user_id": "101051819",
                "user_login": "grimm",
                "user_name": "GRIMM",
                "type": "live",
                "title": "best boxes",
                "viewer_count": 1863,
                "started_at": "2024-03-08T19:00:00Z",
                "thumbnail_url": "https://static-cdn.jtvnw.net/previews-ttv/live_user_grimm-{width}x{height}.jpg"
            }]
        });

        match status_from_response(response(payload), "grimm") {
            LiveStatus::Live {
                title,
                url,
                started_at,
                viewer_count,
                thumbnail_url,
            } => {
                assert_eq!(title, "best boxes");
                assert_eq!(url, "https://twitch.tv/grimm");
                assert_eq!(
                    started_at.unwrap().to_rfc3339(),
                    "2024-03-08T19:00:00+00:00"
                );
                assert_eq!(viewer_count, Some(1863));
                assert_eq!(
                    thumbnail_url.unwrap(),
                    "https://static-cdn.jtvnw.net/previews-ttv/live_user_grimm-1280x720.jpg"
                );
            }
            other => panic!("expected live status, got {other:?}"),
        }
    }

    #[test]
    fn test_non_live_type_is_offline() {
        let payload = json!({ "data": [{ "type": "", "user_login": "grimm" }] });
        assert_eq!(
            status_from_response(response(payload), "grimm"),
            LiveStatus::Offline
        );
    }

    #[test]
    fn test_absent_fields_degrade_without_error() {
        let payload = json!({ "data": [{ "type": "live" }] });
        match status_from_response(response(payload), "grimm") {
            LiveStatus::Live {
                title,
                url,
                started_at,
                viewer_count,
                thumbnail_url,
            } => {
                assert_eq!(title, "");
                assert_eq!(url, "https://twitch.tv/grimm");
                assert!(started_at.is_none());
                assert!(viewer_count.is_none());
                assert!(thumbnail_url.is_none());
            }
            other => panic!("expected live status, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_started_at_becomes_none() {
        let payload = json!({
            "data": [{ "type": "live", "user_login": "grimm", "started_at": "yesterday" }]
        });
        assert_eq!(status_from_response(response(payload), "grimm").started_at(), None);
    }
}
