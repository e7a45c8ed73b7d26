use thiserror::Error;

/// Failures the pipeline distinguishes between.
///
/// Startup variants (`ConfigurationMissing`, `KeywordsUnavailable`, `Config`)
/// abort the run. `ClassificationUnavailable` only skips the current post.
#[derive(Error, Debug)]
pub enum ScoutError {
    /// A required credential or setting is absent
    #[error("Configuration missing: {0} is not set")]
    ConfigurationMissing(String),

    /// A setting is present but cannot be used
    #[error("Configuration error: {0}")]
    Config(String),

    /// Keyword file missing or without usable keywords
    #[error("Keywords unavailable: {0}")]
    KeywordsUnavailable(String),

    /// Classifier call failed or returned malformed output
    #[error("Classification unavailable: {0}")]
    ClassificationUnavailable(String),

    /// Row append or alert dispatch failed
    #[error("Delivery failure: {0}")]
    Delivery(String),
}
