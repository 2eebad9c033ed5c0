//! Environment-driven application configuration.
//!
//! Everything is read once at startup. Platform credentials are optional:
//! a missing pair disables that platform's checks (each affected tuple
//! fails its own poll), never the process.

use std::time::Duration;

use tracing::warn;
use uplink_platforms::prober::ProberConfig;
use uplink_platforms::twitch::TwitchCredentials;
use uplink_platforms::youtube::YouTubeCredentials;

use crate::{Error, Result};

/// Default interval between reconcile passes (five minutes).
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub discord_token: String,
    pub database_url: String,
    pub poll_interval: Duration,
    /// Directory for daily-rolling log files; console only when unset.
    pub log_dir: Option<String>,
    pub twitch: Option<TwitchCredentials>,
    pub youtube: Option<YouTubeCredentials>,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let discord_token =
            std::env::var("DISCORD_TOKEN").map_err(|_| Error::config("DISCORD_TOKEN is not set"))?;

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:uplink.db?mode=rwc".to_string());

        let poll_interval = match std::env::var("UPLINK_POLL_INTERVAL_SECS") {
            Ok(raw) => parse_poll_interval(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        };

        let twitch = twitch_credentials_from_env();
        let youtube = std::env::var("YOUTUBE_API_KEY")
            .ok()
            .map(|api_key| YouTubeCredentials { api_key });
        if twitch.is_none() && youtube.is_none() {
            warn!("No platform credentials configured; every liveness check will fail");
        }

        Ok(Self {
            discord_token,
            database_url,
            poll_interval,
            log_dir: std::env::var("UPLINK_LOG_DIR").ok(),
            twitch,
            youtube,
        })
    }

    /// Credentials bundle for the platform prober.
    pub fn prober_config(&self) -> ProberConfig {
        ProberConfig {
            twitch: self.twitch.clone(),
            youtube: self.youtube.clone(),
            request_timeout: None,
        }
    }
}

fn twitch_credentials_from_env() -> Option<TwitchCredentials> {
    let client_id = std::env::var("TWITCH_CLIENT_ID").ok();
    let access_token = std::env::var("TWITCH_ACCESS_TOKEN").ok();
    match (client_id, access_token) {
        (Some(client_id), Some(access_token)) => Some(TwitchCredentials {
            client_id,
            access_token,
        }),
        (None, None) => None,
        _ => {
            warn!(
                "Incomplete Twitch credentials (need both TWITCH_CLIENT_ID and \
                 TWITCH_ACCESS_TOKEN); Twitch checks disabled"
            );
            None
        }
    }
}

fn parse_poll_interval(raw: &str) -> Result<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| {
        Error::config(format!(
            "UPLINK_POLL_INTERVAL_SECS must be a positive integer, got {raw:?}"
        ))
    })?;
    if secs == 0 {
        return Err(Error::config(
            "UPLINK_POLL_INTERVAL_SECS must be greater than zero",
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poll_interval() {
        assert_eq!(parse_poll_interval("300").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_poll_interval(" 60 ").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_poll_interval_rejects_invalid() {
        assert!(parse_poll_interval("0").is_err());
        assert!(parse_poll_interval("-5").is_err());
        assert!(parse_poll_interval("soon").is_err());
    }
}
