//! Error types for platform probing.

use thiserror::Error;

/// Errors produced while resolving channel liveness.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// HTTP transport failure, including the bounded request timeout.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not parse as the expected JSON shape.
    #[error("Failed to parse API response: {0}")]
    Json(#[from] serde_json::Error),

    /// Platform identifier not recognized.
    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Operator input could not be reduced to a channel identifier.
    #[error("Invalid channel identifier: {0}")]
    InvalidChannel(String),

    /// The platform has no channel under this identifier.
    #[error("Channel not found: {0}")]
    ChannelNotFound(String),

    /// Non-success HTTP status from the platform API.
    #[error("{platform} API returned status {status}")]
    Api { platform: &'static str, status: u16 },

    /// No credentials configured for this platform.
    #[error("Missing credentials for {0}")]
    MissingCredentials(&'static str),
}
