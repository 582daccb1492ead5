//! Multi-country SERP acquisition engine.
//!
//! Fetches search engine result pages for a keyword through a cascade of
//! acquisition strategies ordered by result fidelity: a stealth-shaped
//! headless browser, direct HTTP with rotated fingerprints, and finally
//! the official search API. Every fetch is rate limited, cached with a
//! TTL differentiated by outcome, and filtered down to realistic
//! competitors before it reaches the caller.
//!
//! ```no_run
//! use serpgrab::{EngineConfig, SerpEngine};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let engine = SerpEngine::new(EngineConfig::from_env())?;
//! let results = engine.fetch_serp("running shoes", "ES", None, 2).await?;
//! for result in &results.organic_results {
//!     println!("#{} {} ({})", result.position, result.title, result.domain);
//! }
//! # Ok(())
//! # }
//! ```

pub mod block_detector;
pub mod cache;
pub mod cascade;
pub mod competitor_filter;
pub mod config;
pub mod error;
pub mod extractor;
pub mod locale;
pub mod query;
pub mod rate_limiter;
pub mod shaper;
pub mod stealth;
pub mod strategy;
pub mod suggestions;

pub use cache::{MemoryCache, ResultCache};
pub use cascade::SerpEngine;
pub use competitor_filter::AuthorityDomainSet;
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use locale::{COUNTRY_CONFIGS, CountryConfig, country_config};
pub use query::{
    FeaturedSnippet, OrganicResult, SerpQuery, SerpResultSet, SourceStrategy, SuggestionSet,
};
pub use rate_limiter::RateLimiter;
pub use shaper::RequestShaper;
pub use strategy::{
    AcquisitionStrategy, BrowserAutomationStrategy, DirectHttpStrategy, OfficialApiStrategy,
};
pub use suggestions::SuggestionFetcher;
