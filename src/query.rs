//! Data structures for SERP queries and result sets

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::locale;

/// Maximum result pages a single query may request
pub const MAX_PAGES: usize = 3;

/// Organic results requested per page
pub const RESULTS_PER_PAGE: usize = 10;

/// Cap on "people also ask" questions kept per result set
pub const MAX_PEOPLE_ALSO_ASK: usize = 5;

/// Cap on related searches kept per result set
pub const MAX_RELATED_SEARCHES: usize = 8;

/// Which acquisition path produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    /// Headless browser session
    Browser,
    /// Plain HTTP GET with shaped headers
    DirectHttp,
    /// Credentialed official search API
    OfficialApi,
    /// Terminal empty result after exhausting every strategy
    EmptyFallback,
}

impl SourceStrategy {
    /// Stable identifier used in log lines and rate-limit keys
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceStrategy::Browser => "browser",
            SourceStrategy::DirectHttp => "direct_http",
            SourceStrategy::OfficialApi => "official_api",
            SourceStrategy::EmptyFallback => "empty_fallback",
        }
    }
}

/// Immutable, validated input for one SERP fetch
///
/// Identity for caching is the (keyword, location, language, pages) tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerpQuery {
    /// Search keyword, non-empty after trimming
    pub keyword: String,
    /// Country code, defaults to US when unknown
    pub location: String,
    /// ISO 639-1 language code
    pub language: String,
    /// Result pages to fetch, clamped to 1..=MAX_PAGES
    pub pages: usize,
}

impl SerpQuery {
    /// Validate and normalize query inputs.
    ///
    /// An absent language resolves to the target country's interface
    /// language (callers with a language-detection collaborator pass the
    /// detected code instead).
    pub fn new(
        keyword: &str,
        location: &str,
        language: Option<&str>,
        pages: usize,
    ) -> EngineResult<Self> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(EngineError::InvalidQuery(
                "keyword cannot be empty or whitespace-only".to_string(),
            ));
        }

        let config = locale::country_config(location);
        let language = language
            .map(str::to_string)
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| config.hl.to_string());

        Ok(Self {
            keyword: keyword.to_string(),
            location: config.country.to_string(),
            language,
            pages: pages.clamp(1, MAX_PAGES),
        })
    }

    /// Deterministic cache key for this query
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!(
            "serp:{}:{}:{}:{}",
            self.keyword, self.location, self.language, self.pages
        )
    }

    /// Locale table entry for this query's location
    #[must_use]
    pub fn country(&self) -> &'static locale::CountryConfig {
        locale::country_config(&self.location)
    }
}

/// One ranked organic result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganicResult {
    /// 1-based rank within the query's result set
    pub position: usize,
    /// Result title
    pub title: String,
    /// Absolute destination URL, never the engine's own domain
    pub url: String,
    /// Description snippet, may be empty
    pub snippet: String,
    /// Destination host with any `www.` prefix stripped
    pub domain: String,
}

/// Featured snippet box above the organic results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedSnippet {
    /// Snippet body text
    pub text: String,
    /// Label describing the widget source
    pub source: String,
}

/// Complete normalized result set for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerpResultSet {
    pub keyword: String,
    pub language: String,
    pub location: String,
    /// Engine host the results came from (or would have, for the fallback)
    pub engine_domain: String,
    /// Ranked organic results; order is rank and must be preserved
    pub organic_results: Vec<OrganicResult>,
    pub featured_snippet: Option<FeaturedSnippet>,
    pub people_also_ask: Vec<String>,
    pub related_searches: Vec<String>,
    /// Always equals `organic_results.len()`
    pub total_results: usize,
    pub source: SourceStrategy,
}

impl SerpResultSet {
    /// Skeleton result set for a query, before any results are attached
    #[must_use]
    pub fn new(query: &SerpQuery, source: SourceStrategy) -> Self {
        Self {
            keyword: query.keyword.clone(),
            language: query.language.clone(),
            location: query.location.clone(),
            engine_domain: query.country().domain.to_string(),
            organic_results: Vec::new(),
            featured_snippet: None,
            people_also_ask: Vec::new(),
            related_searches: Vec::new(),
            total_results: 0,
            source,
        }
    }

    /// Terminal empty set returned when every strategy is exhausted
    #[must_use]
    pub fn empty_fallback(query: &SerpQuery) -> Self {
        Self::new(query, SourceStrategy::EmptyFallback)
    }

    /// Replace the organic results, keeping `total_results` consistent
    pub fn set_organic_results(&mut self, results: Vec<OrganicResult>) {
        self.total_results = results.len();
        self.organic_results = results;
    }
}

/// Keyword suggestions for a seed term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionSet {
    pub seed_keyword: String,
    pub language: String,
    pub country: String,
    /// De-duplicated suggestions, seed excluded
    pub suggestions: Vec<String>,
    pub total_found: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_rejects_blank_keyword() {
        assert!(SerpQuery::new("   ", "US", None, 1).is_err());
    }

    #[test]
    fn query_clamps_pages() {
        let q = SerpQuery::new("shoes", "US", None, 9).unwrap();
        assert_eq!(q.pages, MAX_PAGES);
        let q = SerpQuery::new("shoes", "US", None, 0).unwrap();
        assert_eq!(q.pages, 1);
    }

    #[test]
    fn query_defaults_language_from_country() {
        let q = SerpQuery::new("zapatos", "MX", None, 1).unwrap();
        assert_eq!(q.language, "es");
        let q = SerpQuery::new("zapatos", "MX", Some("en"), 1).unwrap();
        assert_eq!(q.language, "en");
    }

    #[test]
    fn unknown_location_normalizes_to_us() {
        let q = SerpQuery::new("shoes", "XX", None, 1).unwrap();
        assert_eq!(q.location, "US");
        assert_eq!(q.country().domain, "google.com");
    }

    #[test]
    fn cache_key_covers_identity_tuple() {
        let a = SerpQuery::new("shoes", "US", Some("en"), 1).unwrap();
        let b = SerpQuery::new("shoes", "US", Some("en"), 2).unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "serp:shoes:US:en:1");
    }

    #[test]
    fn empty_fallback_has_consistent_totals() {
        let q = SerpQuery::new("shoes", "UK", None, 1).unwrap();
        let set = SerpResultSet::empty_fallback(&q);
        assert_eq!(set.total_results, 0);
        assert_eq!(set.source, SourceStrategy::EmptyFallback);
        assert_eq!(set.engine_domain, "google.co.uk");
    }
}
