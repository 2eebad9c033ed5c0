//! Stream watcher module for reconciling announced state.
//!
//! The watcher is responsible for:
//! - Resolving current liveness for every tracked stream
//! - Announcing each live session exactly once
//! - Clearing announcement state when a channel goes offline
//! - Driving the poll cycle, including manual refresh requests

mod probe;
mod service;
mod summary;

pub use probe::LivenessProbe;
pub use service::{PollOutcome, StreamWatcher};
pub use summary::{BatchFailure, BatchSummary};
