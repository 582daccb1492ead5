//! Acquisition strategies behind one polymorphic seam
//!
//! The cascade only ever talks to [`AcquisitionStrategy`]; each
//! implementation knows how to fetch raw result pages for a query and
//! return a normalized set or fail. Keeping the seam this narrow lets the
//! cascade be unit-tested against fakes with no network or browser.

mod api;
mod browser;
mod http;

pub use api::OfficialApiStrategy;
pub use browser::BrowserAutomationStrategy;
pub use http::DirectHttpStrategy;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::query::{SerpQuery, SerpResultSet, SourceStrategy};

/// One way of acquiring SERP data
#[async_trait]
pub trait AcquisitionStrategy: Send + Sync {
    /// Short identifier used in rate-limit keys and log lines
    fn name(&self) -> &'static str;

    /// Source label stamped on result sets this strategy produces
    fn source(&self) -> SourceStrategy;

    /// Whether the strategy can run in this process (configuration,
    /// executables, credentials). Unavailable strategies are skipped by
    /// the cascade without an attempt.
    fn is_available(&self) -> bool {
        true
    }

    /// How long the cascade should cache a non-empty result set from this
    /// strategy
    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(7_200)
    }

    /// Fetch result pages for the query.
    ///
    /// Returning an empty set is a valid outcome; the cascade treats it
    /// the same as an error and advances.
    async fn acquire(&self, query: &SerpQuery) -> EngineResult<SerpResultSet>;
}
