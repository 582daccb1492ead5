//! Error types for SERP acquisition
//!
//! Strategy-level failures are consumed by the cascade and never reach
//! `fetch_serp` callers; the only caller-visible error is a rejected query.

use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Error types for acquisition strategies and the cascade
#[derive(Debug, Error)]
pub enum EngineError {
    /// Query failed validation before any network activity
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// The target site classified the request as automated traffic
    #[error("Blocked by target site at {url}")]
    Blocked { url: String },

    /// Strategy is not configured/usable in this process
    #[error("Strategy unavailable: {0}")]
    Unavailable(&'static str),

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Browser automation failure (launch, navigation, CDP)
    #[error("Browser automation failed: {0}")]
    Browser(String),

    /// Page fetched but no results could be recovered from the markup
    #[error("Extraction failed: {0}")]
    Extraction(String),
}

impl From<anyhow::Error> for EngineError {
    fn from(error: anyhow::Error) -> Self {
        EngineError::Browser(error.to_string())
    }
}

impl EngineError {
    /// Whether this failure indicates the target detected automation.
    ///
    /// Block signals are logged distinctly by the cascade and trigger
    /// browser session recycling; everything else is a plain transient
    /// failure that just advances to the next strategy.
    #[must_use]
    pub fn is_block(&self) -> bool {
        matches!(self, EngineError::Blocked { .. })
    }
}
