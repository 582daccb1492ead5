//! Acquisition cascade and engine facade
//!
//! [`SerpEngine`] is the only type callers need: it validates the query,
//! consults the cache, walks the acquisition strategies in order of result
//! fidelity, filters out non-competable domains, and caches whatever it
//! returns. A query never fails outright; when every strategy is exhausted
//! the caller gets an explicitly labeled empty set, cached briefly so the
//! next attempt retries soon.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::{MemoryCache, ResultCache};
use crate::competitor_filter::AuthorityDomainSet;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::locale;
use crate::query::{SerpQuery, SerpResultSet, SuggestionSet};
use crate::rate_limiter::RateLimiter;
use crate::strategy::{
    AcquisitionStrategy, BrowserAutomationStrategy, DirectHttpStrategy, OfficialApiStrategy,
};
use crate::suggestions::SuggestionFetcher;

pub struct SerpEngine {
    strategies: Vec<Arc<dyn AcquisitionStrategy>>,
    rate_limiter: Arc<RateLimiter>,
    cache: Arc<dyn ResultCache>,
    filter: AuthorityDomainSet,
    suggestions: SuggestionFetcher,
    config: EngineConfig,
}

impl SerpEngine {
    /// Build an engine with the standard strategy order: browser, then
    /// direct HTTP, then the official API.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let strategies: Vec<Arc<dyn AcquisitionStrategy>> = vec![
            Arc::new(BrowserAutomationStrategy::new(&config)),
            Arc::new(DirectHttpStrategy::new(&config)?),
            Arc::new(OfficialApiStrategy::new(&config)?),
        ];
        let cache = Arc::new(MemoryCache::new(config.cache_capacity));
        let suggestions = SuggestionFetcher::new(&config)?;
        Ok(Self::assemble(config, strategies, cache, suggestions))
    }

    /// Build an engine from explicit collaborators. Intended for tests that
    /// substitute fake strategies or a shared cache.
    pub fn with_strategies(
        config: EngineConfig,
        strategies: Vec<Arc<dyn AcquisitionStrategy>>,
        cache: Arc<dyn ResultCache>,
    ) -> EngineResult<Self> {
        let suggestions = SuggestionFetcher::new(&config)?;
        Ok(Self::assemble(config, strategies, cache, suggestions))
    }

    fn assemble(
        config: EngineConfig,
        strategies: Vec<Arc<dyn AcquisitionStrategy>>,
        cache: Arc<dyn ResultCache>,
        suggestions: SuggestionFetcher,
    ) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.min_request_spacing,
            config.hourly_ceiling,
        ));
        Self {
            strategies,
            rate_limiter,
            cache,
            filter: AuthorityDomainSet::default(),
            suggestions,
            config,
        }
    }

    /// Fetch SERP data for a keyword, walking the cascade on a cache miss.
    ///
    /// Errors only on invalid input; acquisition failures degrade to the
    /// empty fallback instead of surfacing.
    pub async fn fetch_serp(
        &self,
        keyword: &str,
        location: &str,
        language: Option<&str>,
        pages: usize,
    ) -> EngineResult<SerpResultSet> {
        let query = SerpQuery::new(keyword, location, language, pages)?;
        let cache_key = query.cache_key();

        if let Some(cached) = self.lookup(&cache_key).await {
            info!(keyword = %query.keyword, source = cached.source.as_str(), "serving cached result set");
            return Ok(cached);
        }

        for strategy in &self.strategies {
            if !strategy.is_available() {
                debug!(strategy = strategy.name(), "strategy unavailable, skipping");
                continue;
            }

            self.rate_limiter
                .acquire(&format!("{}_{}", strategy.name(), query.location))
                .await;

            match strategy.acquire(&query).await {
                Ok(mut set) => {
                    let raw = std::mem::take(&mut set.organic_results);
                    let kept = self.filter.filter(
                        raw,
                        self.config.min_competitors,
                        self.config.max_competitors,
                    );
                    set.set_organic_results(kept);

                    if set.total_results > 0 {
                        info!(
                            strategy = strategy.name(),
                            count = set.total_results,
                            "cascade succeeded"
                        );
                        self.store(&cache_key, &set, strategy.cache_ttl()).await;
                        return Ok(set);
                    }
                    warn!(
                        strategy = strategy.name(),
                        "no realistic competitors extracted, advancing"
                    );
                }
                Err(e) if e.is_block() => {
                    warn!(strategy = strategy.name(), "strategy blocked: {e}");
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), "strategy failed: {e}");
                }
            }
        }

        warn!(keyword = %query.keyword, "all strategies exhausted, returning empty fallback");
        let fallback = SerpResultSet::empty_fallback(&query);
        self.store(&cache_key, &fallback, self.config.empty_ttl)
            .await;
        Ok(fallback)
    }

    /// Fetch keyword suggestions, cached independently of SERP results.
    ///
    /// Autocomplete traffic is cheap and tolerated, so it bypasses the
    /// request limiter; pacing is the fetcher's own inter-request delay.
    pub async fn fetch_suggestions(
        &self,
        seed: &str,
        location: &str,
        language: Option<&str>,
    ) -> EngineResult<SuggestionSet> {
        let country = locale::country_config(location);
        let language = language
            .filter(|l| !l.is_empty())
            .unwrap_or(country.hl)
            .to_string();
        let cache_key = format!("suggestions:{}:{}:{}", seed.trim(), country.country, language);

        if let Some(json) = self.cache.get(&cache_key).await {
            match serde_json::from_str::<SuggestionSet>(&json) {
                Ok(set) => {
                    info!(seed, "serving cached suggestions");
                    return Ok(set);
                }
                Err(e) => debug!("discarding undeserializable cached suggestions: {e}"),
            }
        }

        let set = self.suggestions.fetch(seed, country, &language).await?;
        match serde_json::to_string(&set) {
            Ok(json) => {
                self.cache
                    .set(&cache_key, json, self.config.suggestion_ttl)
                    .await;
            }
            Err(e) => warn!("failed to serialize suggestions for caching: {e}"),
        }
        Ok(set)
    }

    /// Requests counted against the rolling hourly ceiling right now
    pub async fn requests_in_window(&self) -> usize {
        self.rate_limiter.window_len().await
    }

    async fn lookup(&self, cache_key: &str) -> Option<SerpResultSet> {
        let json = self.cache.get(cache_key).await?;
        match serde_json::from_str(&json) {
            Ok(set) => Some(set),
            Err(e) => {
                debug!("discarding undeserializable cached result set: {e}");
                None
            }
        }
    }

    async fn store(&self, cache_key: &str, set: &SerpResultSet, ttl: std::time::Duration) {
        match serde_json::to_string(set) {
            Ok(json) => self.cache.set(cache_key, json, ttl).await,
            Err(e) => warn!("failed to serialize result set for caching: {e}"),
        }
    }
}
