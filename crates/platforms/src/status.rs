//! Platform identity and the platform-neutral liveness result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Supported streaming platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    Youtube,
}

impl Platform {
    /// Canonical lowercase identifier, as persisted and as used in command
    /// option values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Twitch => "twitch",
            Platform::Youtube => "youtube",
        }
    }

    /// Human-facing name for messages and embeds.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Twitch => "Twitch",
            Platform::Youtube => "YouTube",
        }
    }

    /// Parse a stored identifier back into a platform tag.
    pub fn parse(value: &str) -> Result<Self, ProbeError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "twitch" => Ok(Platform::Twitch),
            "youtube" => Ok(Platform::Youtube),
            other => Err(ProbeError::UnsupportedPlatform(other.to_string())),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live status of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LiveStatus {
    /// Channel is currently broadcasting.
    Live {
        /// Stream title (may be empty when the platform omits it).
        title: String,
        /// Watch URL for the running broadcast.
        url: String,
        /// Session start time (if the platform exposes it).
        started_at: Option<DateTime<Utc>>,
        /// Viewer count (if available).
        viewer_count: Option<u64>,
        /// Preview image URL (if available).
        thumbnail_url: Option<String>,
    },
    /// Channel is offline.
    Offline,
}

impl LiveStatus {
    /// Check if the status indicates a running broadcast.
    pub fn is_live(&self) -> bool {
        matches!(self, LiveStatus::Live { .. })
    }

    /// Check if the status indicates the channel is offline.
    pub fn is_offline(&self) -> bool {
        matches!(self, LiveStatus::Offline)
    }

    /// Get the stream title if live.
    pub fn title(&self) -> Option<&str> {
        match self {
            LiveStatus::Live { title, .. } => Some(title),
            LiveStatus::Offline => None,
        }
    }

    /// Get the session start time if the platform reported one.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            LiveStatus::Live { started_at, .. } => *started_at,
            LiveStatus::Offline => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_identifier_round_trip() {
        for platform in [Platform::Twitch, Platform::Youtube] {
            assert_eq!(Platform::parse(platform.as_str()).unwrap(), platform);
        }
    }

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!(Platform::parse("Twitch").unwrap(), Platform::Twitch);
        assert_eq!(Platform::parse(" YOUTUBE ").unwrap(), Platform::Youtube);
    }

    #[test]
    fn test_platform_parse_rejects_unknown() {
        assert!(Platform::parse("kick").is_err());
        assert!(Platform::parse("").is_err());
    }

    #[test]
    fn test_live_status_helpers() {
        let live = LiveStatus::Live {
            title: "Speedrun".to_string(),
            url: "https://twitch.tv/runner".to_string(),
            started_at: None,
            viewer_count: Some(12),
            thumbnail_url: None,
        };
        assert!(live.is_live());
        assert!(!live.is_offline());
        assert_eq!(live.title(), Some("Speedrun"));

        assert!(LiveStatus::Offline.is_offline());
        assert_eq!(LiveStatus::Offline.title(), None);
        assert_eq!(LiveStatus::Offline.started_at(), None);
    }
}
