//! Platform dispatch for liveness checks.
//!
//! One prober owns the shared HTTP client and the per-platform credentials;
//! the [`Platform`] tag selects the fetch path. A platform without
//! configured credentials fails its own lookups only.

use std::time::Duration;

use tracing::debug;

use crate::error::ProbeError;
use crate::status::{LiveStatus, Platform};
use crate::twitch::{self, TwitchCredentials};
use crate::youtube::{self, YouTubeCredentials};

/// Bound applied to every platform request unless overridden.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for [`Prober::new`].
#[derive(Debug, Clone, Default)]
pub struct ProberConfig {
    pub twitch: Option<TwitchCredentials>,
    pub youtube: Option<YouTubeCredentials>,
    /// Per-request timeout; defaults to [`DEFAULT_REQUEST_TIMEOUT`].
    pub request_timeout: Option<Duration>,
}

/// Resolves the live status of a channel on a supported platform.
pub struct Prober {
    client: reqwest::Client,
    twitch: Option<TwitchCredentials>,
    youtube: Option<YouTubeCredentials>,
}

impl Prober {
    /// Create a prober with its own HTTP client.
    pub fn new(config: ProberConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
            .build()?;
        Ok(Self {
            client,
            twitch: config.twitch,
            youtube: config.youtube,
        })
    }

    /// Reduce operator input for a platform to the stored channel name.
    pub fn normalize_channel(platform: Platform, input: &str) -> Result<String, ProbeError> {
        match platform {
            Platform::Twitch => twitch::normalize_channel(input),
            Platform::Youtube => youtube::normalize_channel(input),
        }
    }

    /// Check whether a channel is currently live.
    pub async fn check(&self, platform: Platform, channel: &str) -> Result<LiveStatus, ProbeError> {
        debug!("Checking {} channel {}", platform, channel);
        match platform {
            Platform::Twitch => {
                let credentials = self
                    .twitch
                    .as_ref()
                    .ok_or(ProbeError::MissingCredentials("twitch"))?;
                twitch::fetch_live_status(&self.client, credentials, channel).await
            }
            Platform::Youtube => {
                let credentials = self
                    .youtube
                    .as_ref()
                    .ok_or(ProbeError::MissingCredentials("youtube"))?;
                youtube::fetch_live_status(&self.client, credentials, channel).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_without_credentials_fails_per_platform() {
        let prober = Prober::new(ProberConfig::default()).unwrap();

        let err = prober.check(Platform::Twitch, "grimm").await.unwrap_err();
        assert!(matches!(err, ProbeError::MissingCredentials("twitch")));

        let err = prober.check(Platform::Youtube, "@grimm").await.unwrap_err();
        assert!(matches!(err, ProbeError::MissingCredentials("youtube")));
    }

    #[test]
    fn test_normalize_dispatches_per_platform() {
        assert_eq!(
            Prober::normalize_channel(Platform::Twitch, "twitch.tv/Grimm").unwrap(),
            "grimm"
        );
        assert_eq!(
            Prober::normalize_channel(Platform::Youtube, "grimm").unwrap(),
            "@grimm"
        );
    }
}
