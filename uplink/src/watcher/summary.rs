//! Accounting for one reconcile pass over the tracked set.

use std::fmt;

use crate::Error;
use crate::database::models::TrackedStream;

use super::service::PollOutcome;

/// Result of reconciling every tracked stream once.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Offline to live transitions that announced.
    pub announced: usize,
    /// Live to offline transitions that cleared state.
    pub cleared: usize,
    /// Tuples whose state already matched.
    pub unchanged: usize,
    /// Tuples skipped for lack of a destination.
    pub skipped: usize,
    /// Tuples that failed to reconcile.
    pub failures: Vec<BatchFailure>,
}

/// A failure while reconciling one tuple.
#[derive(Debug)]
pub struct BatchFailure {
    pub guild_id: String,
    pub platform: String,
    pub channel_name: String,
    pub error: String,
}

impl BatchSummary {
    pub fn record(&mut self, outcome: PollOutcome) {
        match outcome {
            PollOutcome::Announced => self.announced += 1,
            PollOutcome::ClearedOffline => self.cleared += 1,
            PollOutcome::StillLive | PollOutcome::StillOffline => self.unchanged += 1,
            PollOutcome::SkippedNoDestination => self.skipped += 1,
        }
    }

    pub fn record_failure(&mut self, stream: &TrackedStream, error: &Error) {
        self.failures.push(BatchFailure {
            guild_id: stream.guild_id.clone(),
            platform: stream.platform.clone(),
            channel_name: stream.channel_name.clone(),
            error: error.to_string(),
        });
    }

    /// Total number of tuples processed.
    pub fn total(&self) -> usize {
        self.announced + self.cleared + self.unchanged + self.skipped + self.failures.len()
    }

    /// True when the pass changed nothing and nothing failed.
    pub fn is_quiet(&self) -> bool {
        self.announced == 0 && self.cleared == 0 && self.failures.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} checked, {} announced, {} cleared, {} unchanged, {} skipped, {} failed",
            self.total(),
            self.announced,
            self.cleared,
            self.unchanged,
            self.skipped,
            self.failures.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uplink_platforms::Platform;

    #[test]
    fn test_record_counts_outcomes() {
        let mut summary = BatchSummary::default();
        summary.record(PollOutcome::Announced);
        summary.record(PollOutcome::StillLive);
        summary.record(PollOutcome::StillOffline);
        summary.record(PollOutcome::ClearedOffline);
        summary.record(PollOutcome::SkippedNoDestination);

        assert_eq!(summary.announced, 1);
        assert_eq!(summary.cleared, 1);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.total(), 5);
        assert!(!summary.is_quiet());
    }

    #[test]
    fn test_record_failure_keeps_tuple_key() {
        let stream = TrackedStream::new("guild-1", Platform::Twitch, "grimm");
        let mut summary = BatchSummary::default();
        summary.record_failure(&stream, &Error::Other("boom".to_string()));

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].guild_id, "guild-1");
        assert_eq!(summary.failures[0].platform, "twitch");
        assert_eq!(summary.failures[0].channel_name, "grimm");
        assert!(summary.failures[0].error.contains("boom"));
        assert!(!summary.is_quiet());
    }

    #[test]
    fn test_quiet_pass() {
        let mut summary = BatchSummary::default();
        summary.record(PollOutcome::StillOffline);
        summary.record(PollOutcome::SkippedNoDestination);

        assert!(summary.is_quiet());
        assert_eq!(
            summary.to_string(),
            "2 checked, 0 announced, 0 cleared, 1 unchanged, 1 skipped, 0 failed"
        );
    }
}
