//! Direct HTTP acquisition strategy
//!
//! Issues plain GETs against the engine's query endpoint with shaped
//! headers over a reused, cookie-keeping client. Faster than the browser
//! strategy but carries a higher block risk, so every response goes through
//! the block detector before extraction. Randomized pre-request and
//! inter-page delays (well above the limiter floor) soften the burst
//! signature.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::block_detector;
use crate::config::{DelayRange, EngineConfig};
use crate::error::{EngineError, EngineResult};
use crate::extractor;
use crate::query::{RESULTS_PER_PAGE, SerpQuery, SerpResultSet, SourceStrategy};
use crate::shaper::RequestShaper;

use super::AcquisitionStrategy;

pub struct DirectHttpStrategy {
    client: reqwest::Client,
    shaper: RequestShaper,
    pre_request_delay_ms: DelayRange,
    page_delay_ms: DelayRange,
    success_ttl: Duration,
    /// Test hook: replaces the `https://{engine_domain}` base
    base_url_override: Option<String>,
}

impl DirectHttpStrategy {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            shaper: RequestShaper,
            pre_request_delay_ms: config.http_pre_request_delay_ms,
            page_delay_ms: config.http_page_delay_ms,
            success_ttl: config.success_ttl,
            base_url_override: None,
        })
    }

    /// Point the strategy at a stand-in server instead of the real engine
    /// domain. Intended for integration tests against a mock server.
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url_override = Some(base.into());
        self
    }

    fn base_url(&self, engine_domain: &str) -> String {
        self.base_url_override
            .clone()
            .unwrap_or_else(|| format!("https://{engine_domain}"))
    }

    async fn random_pause(range: DelayRange) {
        let (min, max) = range;
        if max == 0 {
            return;
        }
        let millis = if min >= max {
            max
        } else {
            rand::rng().random_range(min..=max)
        };
        debug!(millis, "pausing before request");
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl AcquisitionStrategy for DirectHttpStrategy {
    fn name(&self) -> &'static str {
        "direct_http"
    }

    fn source(&self) -> SourceStrategy {
        SourceStrategy::DirectHttp
    }

    fn cache_ttl(&self) -> Duration {
        self.success_ttl
    }

    async fn acquire(&self, query: &SerpQuery) -> EngineResult<SerpResultSet> {
        let country = query.country();
        let base = self.base_url(country.domain);
        let shaped = self.shaper.shape(country);
        let mut set = SerpResultSet::new(query, self.source());

        info!(keyword = %query.keyword, domain = country.domain, "direct HTTP fetch");

        // Cookie priming: land on the engine root once before querying,
        // the way a person arriving at the search box would
        if let Err(e) = self
            .client
            .get(&base)
            .headers(shaped.headers.clone())
            .send()
            .await
        {
            debug!("warm-up request failed: {e}");
        }

        let mut organic = Vec::new();
        for page_index in 0..query.pages {
            if page_index > 0 {
                Self::random_pause(self.page_delay_ms).await;
            }
            Self::random_pause(self.pre_request_delay_ms).await;

            let mut params = vec![
                ("q".to_string(), query.keyword.clone()),
                ("num".to_string(), RESULTS_PER_PAGE.to_string()),
                ("hl".to_string(), country.hl.to_string()),
                ("gl".to_string(), country.gl.to_string()),
            ];
            if page_index > 0 {
                params.push((
                    "start".to_string(),
                    (page_index * RESULTS_PER_PAGE).to_string(),
                ));
            }

            let response = self
                .client
                .get(format!("{base}/search"))
                .headers(shaped.headers.clone())
                .query(&params)
                .send()
                .await?;

            let status = response.status().as_u16();
            let final_url = response.url().to_string();
            let body = response.text().await?;

            if block_detector::is_blocked(&final_url, status, &body) {
                warn!(page = page_index + 1, url = %final_url, "block detected, aborting fetch");
                return Err(EngineError::Blocked { url: final_url });
            }
            if status != 200 {
                warn!(status, page = page_index + 1, "unexpected status, skipping page");
                continue;
            }

            let extraction =
                extractor::extract_page(&body, country.domain, page_index == 0, organic.len());
            debug!(
                page = page_index + 1,
                count = extraction.organic.len(),
                "extracted page"
            );
            organic.extend(extraction.organic);

            if page_index == 0 {
                set.featured_snippet = extraction.featured_snippet;
                set.people_also_ask = extraction.people_also_ask;
                set.related_searches = extraction.related_searches;
            }
        }

        set.set_organic_results(organic);
        Ok(set)
    }
}
