//! Liveness lookup seam between the watcher and the platform APIs.

use async_trait::async_trait;
use uplink_platforms::{LiveStatus, Platform, ProbeError, Prober};

/// Answers whether a channel is live right now.
///
/// [`Prober`] is the production implementation; tests substitute scripted
/// responses.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn check(&self, platform: Platform, channel: &str) -> Result<LiveStatus, ProbeError>;
}

#[async_trait]
impl LivenessProbe for Prober {
    async fn check(&self, platform: Platform, channel: &str) -> Result<LiveStatus, ProbeError> {
        Prober::check(self, platform, channel).await
    }
}
