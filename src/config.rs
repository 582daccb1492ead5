//! Engine configuration
//!
//! Every throttling constant, TTL, and credential lives here rather than in
//! the components, so tests inject a fresh config and deployments tune the
//! values without code changes. `from_env` layers process environment over
//! the defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::competitor_filter::{MAX_COMPETITORS, MIN_COMPETITORS};

/// Inclusive millisecond bounds for a randomized delay
pub type DelayRange = (u64, u64);

/// Tunables for the whole acquisition engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chrome/Chromium executable for the browser strategy; None means
    /// "search standard locations, disable the strategy if nothing found"
    pub chrome_executable: Option<PathBuf>,
    /// Run the browser headless (disable only when debugging)
    pub headless: bool,
    /// Consecutive browser failures before the session is recycled
    pub recycle_after_failures: u32,

    /// Official search API key; absence disables that strategy
    pub api_key: Option<String>,
    /// Official search API engine id (`cx`)
    pub api_engine_id: Option<String>,

    /// Minimum spacing between requests sharing an endpoint key
    pub min_request_spacing: Duration,
    /// Rolling per-hour request ceiling, process-wide
    pub hourly_ceiling: usize,

    /// Randomized pause before each direct-HTTP request
    pub http_pre_request_delay_ms: DelayRange,
    /// Randomized pause between direct-HTTP result pages
    pub http_page_delay_ms: DelayRange,
    /// Randomized pause between browser result pages
    pub browser_page_delay_ms: DelayRange,
    /// How long the browser strategy waits for the result container
    pub result_wait_timeout: Duration,
    /// Per-request transport timeout for direct HTTP
    pub http_timeout: Duration,
    /// Per-request timeout for the official API
    pub api_timeout: Duration,

    /// Cache TTL for non-empty scraped result sets
    pub success_ttl: Duration,
    /// Shorter TTL for empty outcomes, assumed transient and worth retrying
    pub empty_ttl: Duration,
    /// Longer TTL for official-API results, considered authoritative
    pub api_ttl: Duration,
    /// TTL for keyword suggestion sets
    pub suggestion_ttl: Duration,
    /// In-process cache entry capacity
    pub cache_capacity: usize,

    /// Realistic-competitor bounds applied after filtering
    pub min_competitors: usize,
    pub max_competitors: usize,

    /// Pause between suggestion alphabet-expansion requests
    pub suggestion_delay_ms: u64,
    /// Letters of the alphabet used for suggestion expansion
    pub suggestion_alphabet_breadth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            headless: true,
            recycle_after_failures: 3,
            api_key: None,
            api_engine_id: None,
            min_request_spacing: Duration::from_secs(15),
            hourly_ceiling: 20,
            http_pre_request_delay_ms: (8_000, 15_000),
            http_page_delay_ms: (20_000, 35_000),
            browser_page_delay_ms: (15_000, 25_000),
            result_wait_timeout: Duration::from_secs(15),
            http_timeout: Duration::from_secs(25),
            api_timeout: Duration::from_secs(15),
            success_ttl: Duration::from_secs(7_200),
            empty_ttl: Duration::from_secs(1_800),
            api_ttl: Duration::from_secs(14_400),
            suggestion_ttl: Duration::from_secs(86_400),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            min_competitors: MIN_COMPETITORS,
            max_competitors: MAX_COMPETITORS,
            suggestion_delay_ms: 500,
            suggestion_alphabet_breadth: 6,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with process environment.
    ///
    /// Credentials and executable: `CHROME_EXECUTABLE`, `GOOGLE_API_KEY`,
    /// `GOOGLE_CX`. Throttling and TTL overrides, all in whole seconds:
    /// `SERP_MIN_SPACING_SECS`, `SERP_HOURLY_CEILING`,
    /// `SERP_SUCCESS_TTL_SECS`, `SERP_EMPTY_TTL_SECS`, `SERP_API_TTL_SECS`,
    /// `SERP_SUGGESTION_TTL_SECS`. Unset or unparseable values keep the
    /// defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("CHROME_EXECUTABLE") {
            if !path.is_empty() {
                config.chrome_executable = Some(PathBuf::from(path));
            }
        }
        config.api_key = std::env::var("GOOGLE_API_KEY").ok().filter(|v| !v.is_empty());
        config.api_engine_id = std::env::var("GOOGLE_CX").ok().filter(|v| !v.is_empty());

        if let Some(spacing) = env_secs("SERP_MIN_SPACING_SECS") {
            config.min_request_spacing = spacing;
        }
        if let Some(ceiling) = env_parse::<usize>("SERP_HOURLY_CEILING") {
            config.hourly_ceiling = ceiling.max(1);
        }
        if let Some(ttl) = env_secs("SERP_SUCCESS_TTL_SECS") {
            config.success_ttl = ttl;
        }
        if let Some(ttl) = env_secs("SERP_EMPTY_TTL_SECS") {
            config.empty_ttl = ttl;
        }
        if let Some(ttl) = env_secs("SERP_API_TTL_SECS") {
            config.api_ttl = ttl;
        }
        if let Some(ttl) = env_secs("SERP_SUGGESTION_TTL_SECS") {
            config.suggestion_ttl = ttl;
        }
        config
    }

    /// Config with every randomized delay zeroed (tests)
    #[must_use]
    pub fn without_delays(mut self) -> Self {
        self.min_request_spacing = Duration::ZERO;
        self.http_pre_request_delay_ms = (0, 0);
        self.http_page_delay_ms = (0, 0);
        self.browser_page_delay_ms = (0, 0);
        self.suggestion_delay_ms = 0;
        self
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|value| value.parse().ok())
}

fn env_secs(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_throttling_and_ttls() {
        // SAFETY: test-only env mutation; the variable names are unique to
        // this test so parallel tests never observe them.
        unsafe {
            std::env::set_var("SERP_MIN_SPACING_SECS", "30");
            std::env::set_var("SERP_HOURLY_CEILING", "5");
            std::env::set_var("SERP_SUCCESS_TTL_SECS", "600");
            std::env::set_var("SERP_EMPTY_TTL_SECS", "not a number");
        }

        let config = EngineConfig::from_env();
        assert_eq!(config.min_request_spacing, Duration::from_secs(30));
        assert_eq!(config.hourly_ceiling, 5);
        assert_eq!(config.success_ttl, Duration::from_secs(600));
        // Unparseable values keep the default
        assert_eq!(config.empty_ttl, EngineConfig::default().empty_ttl);
        // Untouched settings keep theirs
        assert_eq!(config.api_ttl, EngineConfig::default().api_ttl);

        unsafe {
            std::env::remove_var("SERP_MIN_SPACING_SECS");
            std::env::remove_var("SERP_HOURLY_CEILING");
            std::env::remove_var("SERP_SUCCESS_TTL_SECS");
            std::env::remove_var("SERP_EMPTY_TTL_SECS");
        }
    }
}
