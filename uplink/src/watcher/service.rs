//! Watcher service that reconciles tracked streams against live state.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uplink_platforms::Platform;

use crate::Result;
use crate::announcer::{Announcement, Announcer};
use crate::database::models::TrackedStream;
use crate::database::repositories::StreamRepository;
use crate::database::time::datetime_to_ms;

use super::probe::LivenessProbe;
use super::summary::BatchSummary;

/// What reconciling one tracked stream did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Offline to live transition; an announcement went out.
    Announced,
    /// Live and already announced for this session.
    StillLive,
    /// Live to offline transition; announcement state cleared.
    ClearedOffline,
    /// Offline with nothing to clear.
    StillOffline,
    /// No destination channel configured; nothing was checked.
    SkippedNoDestination,
}

/// Reconciles tracked streams: announces each live session once and clears
/// state on offline, so repeated polling of an unchanged stream is a no-op.
pub struct StreamWatcher<R, P, A> {
    repository: Arc<R>,
    probe: Arc<P>,
    announcer: Arc<A>,
}

impl<R, P, A> StreamWatcher<R, P, A>
where
    R: StreamRepository + 'static,
    P: LivenessProbe + 'static,
    A: Announcer + 'static,
{
    pub fn new(repository: Arc<R>, probe: Arc<P>, announcer: Arc<A>) -> Self {
        Self {
            repository,
            probe,
            announcer,
        }
    }

    /// Reconcile one tracked stream.
    ///
    /// The announcement goes out before the state write, so a failed send
    /// leaves `last_announced_at` untouched and the next cycle retries.
    /// Errors here concern only this tuple.
    pub async fn poll_once(&self, stream: &TrackedStream) -> Result<PollOutcome> {
        let platform = Platform::parse(&stream.platform)?;

        let Some(destination) = stream.announce_channel_id.as_deref() else {
            warn!(
                "No announcement channel for {}/{} in guild {}, skipping",
                platform, stream.channel_name, stream.guild_id
            );
            return Ok(PollOutcome::SkippedNoDestination);
        };

        let status = self.probe.check(platform, &stream.channel_name).await?;

        match Announcement::from_status(stream, platform, &status) {
            Some(announcement) => {
                if !should_announce(stream.last_announced_at, announcement.started_at) {
                    return Ok(PollOutcome::StillLive);
                }

                info!(
                    "{} went live on {} (guild {}), announcing to channel {}",
                    stream.channel_name, platform, stream.guild_id, destination
                );
                self.announcer.announce(destination, &announcement).await?;

                // Platforms without a session start get the send time, so
                // the unset check alone gates re-announcement for them.
                let session_start = announcement.started_at.unwrap_or_else(Utc::now);
                self.repository
                    .set_last_announced(
                        &stream.guild_id,
                        platform,
                        &stream.channel_name,
                        session_start,
                    )
                    .await?;
                Ok(PollOutcome::Announced)
            }
            None => {
                if stream.last_announced_at.is_none() {
                    return Ok(PollOutcome::StillOffline);
                }

                info!(
                    "{} went offline on {} (guild {})",
                    stream.channel_name, platform, stream.guild_id
                );
                self.repository
                    .clear_last_announced(&stream.guild_id, platform, &stream.channel_name)
                    .await?;
                Ok(PollOutcome::ClearedOffline)
            }
        }
    }

    /// Reconcile every tracked stream, sequentially, in insertion order.
    ///
    /// A failing tuple is recorded in the summary and does not abort the
    /// rest of the batch; only the initial read of the tracked set fails
    /// the whole pass.
    pub async fn poll_all(&self) -> Result<BatchSummary> {
        let streams = self.repository.list_streams().await?;
        let mut summary = BatchSummary::default();

        for stream in &streams {
            match self.poll_once(stream).await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    warn!(
                        "Check failed for {}/{} in guild {}: {}",
                        stream.platform, stream.channel_name, stream.guild_id, e
                    );
                    summary.record_failure(stream, &e);
                }
            }
        }

        Ok(summary)
    }

    /// Drive reconcile passes until cancelled.
    ///
    /// One pass runs at startup, then one per interval tick or manual
    /// refresh. Cancellation is observed between passes, so an in-flight
    /// pass always finishes.
    pub async fn run(
        &self,
        interval: Duration,
        refresh: Arc<Notify>,
        cancellation_token: CancellationToken,
    ) {
        info!("Stream watcher running, checking every {:?}", interval);
        self.reconcile_pass().await;

        loop {
            tokio::select! {
                biased;

                _ = cancellation_token.cancelled() => {
                    info!("Stream watcher shutting down");
                    break;
                }
                _ = refresh.notified() => {
                    debug!("Manual stream check requested");
                }
                _ = tokio::time::sleep(interval) => {}
            }

            if cancellation_token.is_cancelled() {
                break;
            }

            self.reconcile_pass().await;
        }

        debug!("Stream watcher stopped");
    }

    async fn reconcile_pass(&self) {
        match self.poll_all().await {
            Ok(summary) if summary.is_quiet() => debug!("Reconcile pass: {}", summary),
            Ok(summary) => info!("Reconcile pass: {}", summary),
            Err(e) => warn!("Reconcile pass aborted: {}", e),
        }
    }
}

/// Announce when nothing is recorded for the channel, or when the observed
/// session started after the one already announced. Sessions without a
/// start time never outrank a recorded announcement, which keeps restarts
/// from re-announcing a running stream.
fn should_announce(last_announced_ms: Option<i64>, started_at: Option<DateTime<Utc>>) -> bool {
    match (last_announced_ms, started_at) {
        (None, _) => true,
        (Some(last), Some(started)) => last < datetime_to_ms(started),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_announces_when_nothing_recorded() {
        assert!(should_announce(None, Some(at(1_700_000_000))));
        assert!(should_announce(None, None));
    }

    #[test]
    fn test_same_session_not_reannounced() {
        let start = at(1_700_000_000);
        assert!(!should_announce(Some(datetime_to_ms(start)), Some(start)));
    }

    #[test]
    fn test_newer_session_announces_again() {
        let first = at(1_700_000_000);
        let second = at(1_700_003_600);
        assert!(should_announce(Some(datetime_to_ms(first)), Some(second)));
    }

    #[test]
    fn test_older_session_stays_quiet() {
        let first = at(1_700_000_000);
        let stale = at(1_699_990_000);
        assert!(!should_announce(Some(datetime_to_ms(first)), Some(stale)));
    }

    #[test]
    fn test_missing_start_never_outranks_recorded_state() {
        assert!(!should_announce(Some(1_700_000_000_000), None));
    }

    #[test]
    fn test_submillisecond_start_drift_is_ignored() {
        // A start time whose sub-millisecond part survives parsing must
        // still compare equal to its stored millisecond truncation.
        let start = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        assert!(!should_announce(Some(datetime_to_ms(start)), Some(start)));
    }
}
