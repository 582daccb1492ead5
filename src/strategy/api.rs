//! Official Custom Search JSON API strategy
//!
//! Last resort before the empty fallback: metered and credentialed, but
//! immune to blocking, so it needs no block detection or humanized pacing.
//! The API caps a request at ten results, so multi-page queries collapse
//! to a single page here.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::extractor;
use crate::query::{OrganicResult, RESULTS_PER_PAGE, SerpQuery, SerpResultSet, SourceStrategy};

use super::AcquisitionStrategy;

const API_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

pub struct OfficialApiStrategy {
    client: reqwest::Client,
    api_key: Option<String>,
    engine_id: Option<String>,
    api_ttl: Duration,
    /// Test hook: replaces the production API endpoint
    endpoint_override: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    items: Option<Vec<ApiItem>>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
    title: String,
    link: String,
    snippet: Option<String>,
}

impl OfficialApiStrategy {
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            engine_id: config.api_engine_id.clone(),
            api_ttl: config.api_ttl,
            endpoint_override: None,
        })
    }

    /// Point the strategy at a stand-in endpoint for integration tests.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint_override = Some(endpoint.into());
        self
    }

    fn endpoint(&self) -> &str {
        self.endpoint_override.as_deref().unwrap_or(API_ENDPOINT)
    }
}

#[async_trait]
impl AcquisitionStrategy for OfficialApiStrategy {
    fn name(&self) -> &'static str {
        "official_api"
    }

    fn source(&self) -> SourceStrategy {
        SourceStrategy::OfficialApi
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    fn cache_ttl(&self) -> Duration {
        self.api_ttl
    }

    async fn acquire(&self, query: &SerpQuery) -> EngineResult<SerpResultSet> {
        let (key, cx) = match (&self.api_key, &self.engine_id) {
            (Some(key), Some(cx)) => (key, cx),
            _ => return Err(EngineError::Unavailable("API credentials not configured")),
        };

        let country = query.country();
        info!(keyword = %query.keyword, "official API fetch");

        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("key", key.as_str()),
                ("cx", cx.as_str()),
                ("q", query.keyword.as_str()),
                ("num", &RESULTS_PER_PAGE.to_string()),
                ("lr", &format!("lang_{}", query.language)),
                ("gl", &country.gl.to_lowercase()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let parsed: ApiResponse = response.json().await?;
        let items = parsed.items.unwrap_or_default();
        debug!(count = items.len(), "API returned items");

        let organic = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| OrganicResult {
                position: index + 1,
                domain: extractor::domain_of(&item.link),
                title: item.title,
                url: item.link,
                snippet: item.snippet.unwrap_or_default(),
            })
            .collect();

        let mut set = SerpResultSet::new(query, self.source());
        set.set_organic_results(organic);
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> OfficialApiStrategy {
        let mut config = EngineConfig::default();
        config.api_key = Some("test-key".to_string());
        config.api_engine_id = Some("test-cx".to_string());
        OfficialApiStrategy::new(&config).unwrap()
    }

    #[test]
    fn unavailable_without_credentials() {
        let strategy = OfficialApiStrategy::new(&EngineConfig::default()).unwrap();
        assert!(!strategy.is_available());
        assert!(configured().is_available());
    }

    #[tokio::test]
    async fn acquire_without_credentials_is_an_error() {
        let strategy = OfficialApiStrategy::new(&EngineConfig::default()).unwrap();
        let query = SerpQuery::new("shoes", "US", None, 1).unwrap();
        assert!(matches!(
            strategy.acquire(&query).await,
            Err(EngineError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn parses_items_and_assigns_positions() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items":[
                    {"title":"First","link":"https://www.first.example/a","snippet":"one"},
                    {"title":"Second","link":"https://second.example/b"}
                ]}"#,
            )
            .create_async()
            .await;

        let strategy = configured().with_endpoint(server.url());
        let query = SerpQuery::new("shoes", "ES", None, 1).unwrap();
        let set = strategy.acquire(&query).await.unwrap();

        mock.assert_async().await;
        assert_eq!(set.total_results, 2);
        assert_eq!(set.source, SourceStrategy::OfficialApi);
        assert_eq!(set.organic_results[0].position, 1);
        assert_eq!(set.organic_results[0].domain, "first.example");
        assert_eq!(set.organic_results[1].position, 2);
        assert_eq!(set.organic_results[1].snippet, "");
    }

    #[tokio::test]
    async fn missing_items_yields_empty_set() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"searchInformation":{"totalResults":"0"}}"#)
            .create_async()
            .await;

        let strategy = configured().with_endpoint(server.url());
        let query = SerpQuery::new("nonexistentquery", "US", None, 1).unwrap();
        let set = strategy.acquire(&query).await.unwrap();
        assert_eq!(set.total_results, 0);
    }
}
