//! Keyword suggestion acquisition
//!
//! Talks to the engine's autocomplete endpoint, which tolerates automation
//! far better than the result pages, so there is no block detection here.
//! Coverage beyond the seed term comes from alphabet expansion: the seed is
//! re-queried with a trailing letter for the first few letters of the
//! query language's alphabet, including locale-specific characters.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::locale::{self, CountryConfig};
use crate::query::SuggestionSet;

const SUGGEST_ENDPOINT: &str = "https://suggestqueries.google.com/complete/search";

/// Most suggestions retained per seed keyword
pub const MAX_SUGGESTIONS: usize = 50;

/// Suggestions shorter than this are discarded as noise
const MIN_SUGGESTION_LEN: usize = 3;

pub struct SuggestionFetcher {
    client: reqwest::Client,
    delay_ms: u64,
    alphabet_breadth: usize,
    /// Test hook: replaces the production autocomplete endpoint
    endpoint_override: Option<String>,
}

impl SuggestionFetcher {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;

        Ok(Self {
            client,
            delay_ms: config.suggestion_delay_ms,
            alphabet_breadth: config.suggestion_alphabet_breadth,
            endpoint_override: None,
        })
    }

    /// Point the fetcher at a stand-in endpoint for integration tests.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    fn endpoint(&self) -> &str {
        self.endpoint_override.as_deref().unwrap_or(SUGGEST_ENDPOINT)
    }

    /// Collect suggestions for a seed keyword: one direct query plus
    /// alphabet-expanded variants, de-duplicated case-insensitively with the
    /// seed itself excluded.
    pub async fn fetch(
        &self,
        seed: &str,
        country: &CountryConfig,
        language: &str,
    ) -> EngineResult<SuggestionSet> {
        info!(seed, language, "fetching keyword suggestions");

        let mut suggestions: Vec<String> = Vec::new();
        let mut seen: Vec<String> = vec![seed.trim().to_lowercase()];

        self.collect(seed, country, language, &mut suggestions, &mut seen)
            .await;

        for letter in locale::alphabet_for(language)
            .chars()
            .take(self.alphabet_breadth)
        {
            if suggestions.len() >= MAX_SUGGESTIONS {
                break;
            }
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            let expanded = format!("{seed} {letter}");
            self.collect(&expanded, country, language, &mut suggestions, &mut seen)
                .await;
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        debug!(count = suggestions.len(), "suggestion collection complete");

        Ok(SuggestionSet {
            seed_keyword: seed.to_string(),
            language: language.to_string(),
            country: country.country.to_string(),
            total_found: suggestions.len(),
            suggestions,
        })
    }

    /// One autocomplete request; failures are logged and skipped so a single
    /// bad variant never sinks the whole set
    async fn collect(
        &self,
        term: &str,
        country: &CountryConfig,
        language: &str,
        suggestions: &mut Vec<String>,
        seen: &mut Vec<String>,
    ) {
        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("client", "chrome"),
                ("q", term),
                ("gl", country.gl),
                ("hl", language),
            ])
            .send()
            .await;

        let body = match response {
            Ok(response) => match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(term, "failed to read suggestion response: {e}");
                    return;
                }
            },
            Err(e) => {
                warn!(term, "suggestion request failed: {e}");
                return;
            }
        };

        for suggestion in parse_suggestions(&body) {
            let normalized = suggestion.to_lowercase();
            if suggestion.len() < MIN_SUGGESTION_LEN || seen.contains(&normalized) {
                continue;
            }
            seen.push(normalized);
            suggestions.push(suggestion);
        }
    }
}

/// The autocomplete payload is `[query, [suggestions], ...]`; anything else
/// yields nothing
fn parse_suggestions(body: &str) -> Vec<String> {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!("unparseable suggestion payload: {e}");
            return Vec::new();
        }
    };

    parsed
        .get(1)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::country_config;

    #[test]
    fn parses_the_autocomplete_array_shape() {
        let body = r#"["shoes",["shoes for men","shoes online","shoes sale"],[],{}]"#;
        assert_eq!(
            parse_suggestions(body),
            vec!["shoes for men", "shoes online", "shoes sale"]
        );
    }

    #[test]
    fn malformed_payloads_yield_nothing() {
        assert!(parse_suggestions("not json").is_empty());
        assert!(parse_suggestions("{}").is_empty());
        assert!(parse_suggestions(r#"["only the query"]"#).is_empty());
    }

    #[tokio::test]
    async fn dedupes_and_excludes_the_seed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"["shoes",["Shoes","shoes online","SHOES ONLINE","shoes","ab"]]"#)
            .expect_at_least(1)
            .create_async()
            .await;

        let config = EngineConfig::default().without_delays();
        let fetcher = SuggestionFetcher::new(&config)
            .unwrap()
            .with_endpoint(server.url());
        let set = fetcher
            .fetch("shoes", country_config("US"), "en")
            .await
            .unwrap();

        assert_eq!(set.suggestions, vec!["shoes online"]);
        assert_eq!(set.total_found, 1);
        assert_eq!(set.seed_keyword, "shoes");
    }

    #[tokio::test]
    async fn alphabet_expansion_issues_extra_requests() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_body(r#"["seed",[]]"#)
            .expect(4)
            .create_async()
            .await;

        let mut config = EngineConfig::default().without_delays();
        config.suggestion_alphabet_breadth = 3;
        let fetcher = SuggestionFetcher::new(&config)
            .unwrap()
            .with_endpoint(server.url());
        fetcher
            .fetch("seed", country_config("US"), "en")
            .await
            .unwrap();

        mock.assert_async().await;
    }
}
