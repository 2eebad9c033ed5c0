//! Liveness lookups for supported streaming platforms.
//!
//! This crate answers one question: is a given channel live right now, and
//! if so, with what metadata. Each platform gets a small fetcher over its
//! official HTTP API; the [`Prober`] owns the shared client and credentials
//! and dispatches on the [`Platform`] tag.

pub mod error;
pub mod prober;
pub mod status;
pub mod twitch;
pub mod youtube;

pub use error::ProbeError;
pub use prober::{Prober, ProberConfig};
pub use status::{LiveStatus, Platform};
