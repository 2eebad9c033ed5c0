//! uplink library crate.
//!
//! This module exposes the bot's subsystems for integration testing.

pub mod announcer;
pub mod bot;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod watcher;

pub use error::{Error, Result};
