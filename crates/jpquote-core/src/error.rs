//! Error types for the jpquote-core library.
//!
//! Failing to find a name or a price is not an error: those outcomes are
//! carried as [`Extracted::NotAvailable`](crate::Extracted) values. Errors are
//! reserved for unreadable input and broken configuration.

use thiserror::Error;

/// Main error type for the jpquote library.
#[derive(Error, Debug)]
pub enum QuoteError {
    /// The document is empty or contains no readable text.
    #[error("input unreadable: {0}")]
    InputUnreadable(String),

    /// A caller asked for a profile id that is not configured.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while compiling the profile table.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A price pattern failed to compile.
    #[error("invalid pattern in profile {profile}: {pattern}: {reason}")]
    InvalidPattern {
        profile: String,
        pattern: String,
        reason: String,
    },

    /// A price pattern has no capture group for the amount.
    #[error("pattern in profile {profile} has no amount capture group: {pattern}")]
    MissingCapture { profile: String, pattern: String },

    /// A CSS selector failed to parse.
    #[error("invalid selector in profile {profile}: {selector}")]
    InvalidSelector { profile: String, selector: String },

    /// Two profiles share the same id.
    #[error("duplicate profile id: {0}")]
    DuplicateProfile(String),

    /// The conversion rate is not a positive decimal.
    #[error("invalid conversion rate: {0}")]
    InvalidRate(String),
}

/// Result type for the jpquote library.
pub type Result<T> = std::result::Result<T, QuoteError>;
