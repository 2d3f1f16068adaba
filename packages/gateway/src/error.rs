//! Error types for the composer.
//!
//! Uses the dual-error pattern: `ComposerError` for library consumers with
//! detailed error context, and `MarkupError` from the markup crate wrapped
//! for scanning failures.

use composer_markup::MarkupError;
use thiserror::Error;

/// Main error type for the composer library.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml_ng::Error),

    /// URL is not absolute http(s).
    #[error("Invalid URL '{0}'. Expected an absolute http or https URL")]
    InvalidUrl(String),

    /// Session value given on the command line is not KEY=VALUE.
    #[error("Invalid session value '{0}'. Expected KEY=VALUE")]
    InvalidSessionValue(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to download the template.
    #[error("Failed to download template {url}: {source}")]
    TemplateDownload {
        url: String,
        #[source]
        source: Box<ComposerError>,
    },

    /// All retry attempts exhausted.
    #[error("Request failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// Response body exceeds the configured limit.
    #[error("Response from {url} is at least {size} bytes, exceeding the limit of {limit} bytes")]
    ResponseTooLarge { url: String, size: u64, limit: u64 },

    /// Markup scanning failed.
    #[error("Markup parsing failed: {0}")]
    Markup(#[from] MarkupError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for composer operations.
pub type Result<T> = std::result::Result<T, ComposerError>;
