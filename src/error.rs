//! Error types for voice-intake.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Voice/transport channel errors.
///
/// The only failures that surface to the user, and only as a status
/// indicator on the connection, never as an interview-breaking error.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} disconnected: {reason}")]
    Disconnected { name: String, reason: String },

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },
}

/// Extraction failures, in the order the pipeline can hit them.
///
/// None of these escape the extractor: every variant is logged and collapsed
/// into the no-update default, so the interview can stall but never crash.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No oracle credentials were configured; extraction is disabled for the
    /// whole session.
    #[error("extraction oracle has no credentials configured")]
    MissingCredentials,

    /// The oracle replied, but not with the mandated JSON shape.
    #[error("oracle response not usable: {reason}")]
    InvalidResponse { reason: String, raw: String },

    /// The oracle call itself failed (network, auth, provider-side).
    #[error("oracle call failed: {0}")]
    Upstream(#[from] LlmError),

    /// The oracle did not answer within the configured deadline.
    #[error("oracle call timed out after {0:?}")]
    Timeout(Duration),
}
