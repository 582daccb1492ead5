//! Headless browser acquisition strategy
//!
//! Drives a real Chrome/Chromium session over CDP. The session is reused
//! across queries behind a mutex that also serializes navigation, and is
//! recycled after a block signal or a streak of failures so a burned
//! fingerprint doesn't persist. Unavailable (and skipped by the cascade)
//! when no Chrome executable can be found.

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use futures::StreamExt;
use rand::Rng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::block_detector;
use crate::config::{DelayRange, EngineConfig};
use crate::error::{EngineError, EngineResult};
use crate::extractor;
use crate::locale::CountryConfig;
use crate::query::{RESULTS_PER_PAGE, SerpQuery, SerpResultSet, SourceStrategy};
use crate::shaper::{Fingerprint, RequestShaper};
use crate::stealth;

use super::AcquisitionStrategy;

const RESULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Any of the current organic-result containers; presence means the page
/// finished rendering results
const RESULT_CONTAINER_PROBE: &str = "div.g, div.MjjYud, div.yuRUbf";

/// Standard install locations checked when no executable is configured
const CHROME_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/opt/google/chrome/chrome",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
];

fn resolve_chrome(configured: Option<&PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Some(path.clone());
        }
        warn!(
            "configured Chrome executable does not exist: {}",
            path.display()
        );
    }
    CHROME_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// A live browser plus its CDP event pump and on-disk profile
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_data_dir: PathBuf,
    fingerprint: Fingerprint,
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
        if let Err(e) = std::fs::remove_dir_all(&self.user_data_dir) {
            debug!("failed to remove browser profile dir: {e}");
        }
    }
}

pub struct BrowserAutomationStrategy {
    /// Live session, lazily launched; the lock also serializes navigation
    session: Mutex<Option<BrowserSession>>,
    chrome_path: Option<PathBuf>,
    headless: bool,
    shaper: RequestShaper,
    page_delay_ms: DelayRange,
    result_wait_timeout: Duration,
    recycle_after_failures: u32,
    failure_streak: AtomicU32,
    success_ttl: Duration,
}

impl BrowserAutomationStrategy {
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let chrome_path = resolve_chrome(config.chrome_executable.as_ref());
        match &chrome_path {
            Some(path) => info!("browser strategy using Chrome at {}", path.display()),
            None => warn!("no Chrome executable found, browser strategy disabled"),
        }

        Self {
            session: Mutex::new(None),
            chrome_path,
            headless: config.headless,
            shaper: RequestShaper,
            page_delay_ms: config.browser_page_delay_ms,
            result_wait_timeout: config.result_wait_timeout,
            recycle_after_failures: config.recycle_after_failures,
            failure_streak: AtomicU32::new(0),
            success_ttl: config.success_ttl,
        }
    }

    async fn launch(&self, country: &CountryConfig) -> EngineResult<BrowserSession> {
        let chrome = self
            .chrome_path
            .clone()
            .ok_or(EngineError::Unavailable("no Chrome executable found"))?;

        let fingerprint = self.shaper.shape(country).fingerprint;
        let (width, height) = fingerprint.viewport;

        let user_data_dir = std::env::temp_dir().join(format!(
            "serpgrab_chrome_{}_{}",
            std::process::id(),
            rand::rng().random_range(0u32..u32::MAX)
        ));
        std::fs::create_dir_all(&user_data_dir)
            .map_err(|e| EngineError::Browser(format!("failed to create profile dir: {e}")))?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .window_size(width, height)
            .user_data_dir(user_data_dir.clone())
            .chrome_executable(chrome);
        builder = if self.headless {
            builder.headless_mode(HeadlessMode::default())
        } else {
            builder.with_head()
        };
        builder = builder
            .arg(format!("--user-agent={}", fingerprint.user_agent))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-notifications")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-background-networking")
            .arg("--disable-breakpad")
            .arg("--disable-hang-monitor")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--password-store=basic")
            .arg("--use-mock-keychain")
            .arg("--hide-scrollbars")
            .arg("--mute-audio");

        let browser_config = builder
            .build()
            .map_err(|e| EngineError::Browser(format!("failed to build browser config: {e}")))?;

        info!(width, height, "launching browser session");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| EngineError::Browser(format!("failed to launch browser: {e}")))?;

        let handler_task = task::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    let msg = e.to_string();
                    // Chrome emits CDP events chromiumoxide can't deserialize;
                    // those are noise, not failures
                    if msg.contains("data did not match any variant of untagged enum Message") {
                        trace!("suppressed CDP deserialization error: {msg}");
                    } else {
                        error!("browser handler error: {msg}");
                    }
                }
            }
            debug!("browser handler task finished");
        });

        Ok(BrowserSession {
            browser,
            handler_task,
            user_data_dir,
            fingerprint,
        })
    }

    async fn teardown(slot: &mut Option<BrowserSession>) {
        if let Some(mut session) = slot.take() {
            info!("recycling browser session");
            if let Err(e) = session.browser.close().await {
                debug!("browser close failed: {e}");
            }
            let _ = session.browser.wait().await;
        }
    }

    fn search_url(
        country: &CountryConfig,
        query: &SerpQuery,
        page_index: usize,
    ) -> EngineResult<Url> {
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
        Url::parse_with_params(&format!("https://{}/search", country.domain), &params)
            .map_err(|e| EngineError::Extraction(format!("failed to build search URL: {e}")))
    }

    /// Poll for a result container until it appears or the wait budget runs
    /// out. A timeout is not fatal; extraction simply finds nothing.
    async fn wait_for_results(&self, page: &Page) -> bool {
        let deadline = Instant::now() + self.result_wait_timeout;
        while Instant::now() < deadline {
            if page.find_element(RESULT_CONTAINER_PROBE).await.is_ok() {
                return true;
            }
            tokio::time::sleep(RESULT_POLL_INTERVAL).await;
        }
        false
    }

    async fn fetch_page(
        &self,
        session: &BrowserSession,
        query: &SerpQuery,
        page_index: usize,
        position_offset: usize,
    ) -> EngineResult<extractor::PageExtraction> {
        let country = query.country();
        let url = Self::search_url(country, query, page_index)?;

        let page = session
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(format!("failed to open page: {e}")))?;

        let result = self
            .navigate_and_extract(session, &page, &url, country, page_index, position_offset)
            .await;

        if let Err(e) = page.close().await {
            debug!("page close failed: {e}");
        }
        result
    }

    async fn navigate_and_extract(
        &self,
        session: &BrowserSession,
        page: &Page,
        url: &Url,
        country: &CountryConfig,
        page_index: usize,
        position_offset: usize,
    ) -> EngineResult<extractor::PageExtraction> {
        stealth::prepare_page(page, &session.fingerprint).await?;

        debug!(page = page_index + 1, url = %url, "navigating");
        page.goto(url.as_str())
            .await
            .map_err(|e| EngineError::Browser(format!("navigation failed: {e}")))?;
        let _ = page.wait_for_navigation().await;

        if !self.wait_for_results(page).await {
            debug!(page = page_index + 1, "result container never appeared");
        }

        // Redirects to an interstitial show up in the landed URL before any
        // content is worth reading
        let landed = page.url().await.ok().flatten().unwrap_or_default();
        if block_detector::is_blocked(&landed, 200, "") {
            warn!(url = %landed, "landed on a block interstitial");
            return Err(EngineError::Blocked { url: landed });
        }

        stealth::simulate_human(page).await;

        let html = page
            .content()
            .await
            .map_err(|e| EngineError::Browser(format!("failed to read page content: {e}")))?;
        if block_detector::is_blocked(&landed, 200, &html) {
            warn!(url = %landed, "block phrasing found in page content");
            return Err(EngineError::Blocked { url: landed });
        }

        Ok(extractor::extract_page(
            &html,
            country.domain,
            page_index == 0,
            position_offset,
        ))
    }

    async fn fetch_all_pages(
        &self,
        slot: &mut Option<BrowserSession>,
        query: &SerpQuery,
    ) -> EngineResult<SerpResultSet> {
        if slot.is_none() {
            *slot = Some(self.launch(query.country()).await?);
        }
        let Some(session) = slot.as_ref() else {
            return Err(EngineError::Unavailable("browser session missing"));
        };

        let mut set = SerpResultSet::new(query, self.source());
        let mut organic = Vec::new();

        for page_index in 0..query.pages {
            if page_index > 0 {
                let (min, max) = self.page_delay_ms;
                if max > 0 {
                    let millis = if min >= max {
                        max
                    } else {
                        rand::rng().random_range(min..=max)
                    };
                    debug!(millis, "pausing between result pages");
                    tokio::time::sleep(Duration::from_millis(millis)).await;
                }
            }

            let extraction = self
                .fetch_page(session, query, page_index, organic.len())
                .await?;
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

#[async_trait]
impl AcquisitionStrategy for BrowserAutomationStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    fn source(&self) -> SourceStrategy {
        SourceStrategy::Browser
    }

    fn is_available(&self) -> bool {
        self.chrome_path.is_some()
    }

    fn cache_ttl(&self) -> Duration {
        self.success_ttl
    }

    async fn acquire(&self, query: &SerpQuery) -> EngineResult<SerpResultSet> {
        if self.chrome_path.is_none() {
            return Err(EngineError::Unavailable("no Chrome executable found"));
        }

        info!(keyword = %query.keyword, "browser fetch");
        let mut slot = self.session.lock().await;
        let result = self.fetch_all_pages(&mut slot, query).await;

        match &result {
            Ok(_) => {
                self.failure_streak.store(0, Ordering::Relaxed);
            }
            Err(e) => {
                let streak = self.failure_streak.fetch_add(1, Ordering::Relaxed) + 1;
                if e.is_block() || streak >= self.recycle_after_failures {
                    Self::teardown(&mut slot).await;
                    self.failure_streak.store(0, Ordering::Relaxed);
                } else {
                    debug!(streak, "browser failure recorded");
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::country_config;

    #[test]
    fn configured_executable_wins_when_present() {
        let dir = std::env::temp_dir().join(format!("serpgrab_chrome_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let fake = dir.join("chrome");
        std::fs::write(&fake, b"").unwrap();

        assert_eq!(resolve_chrome(Some(&fake)), Some(fake.clone()));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn search_url_carries_locale_and_paging() {
        let query = SerpQuery::new("zapatos rojos", "ES", None, 3).unwrap();
        let country = country_config("ES");

        let first = BrowserAutomationStrategy::search_url(country, &query, 0).unwrap();
        assert_eq!(first.host_str(), Some("google.es"));
        assert!(first.query().unwrap().contains("q=zapatos+rojos"));
        assert!(first.query().unwrap().contains("hl=es"));
        assert!(!first.query().unwrap().contains("start="));

        let third = BrowserAutomationStrategy::search_url(country, &query, 2).unwrap();
        assert!(third.query().unwrap().contains("start=20"));
    }

    #[tokio::test]
    async fn acquire_without_chrome_is_unavailable() {
        let config = EngineConfig::default();
        let strategy = BrowserAutomationStrategy {
            session: Mutex::new(None),
            chrome_path: None,
            headless: true,
            shaper: RequestShaper,
            page_delay_ms: (0, 0),
            result_wait_timeout: Duration::from_secs(1),
            recycle_after_failures: config.recycle_after_failures,
            failure_streak: AtomicU32::new(0),
            success_ttl: config.success_ttl,
        };
        assert!(!strategy.is_available());
        let query = SerpQuery::new("shoes", "US", None, 1).unwrap();
        assert!(matches!(
            strategy.acquire(&query).await,
            Err(EngineError::Unavailable(_))
        ));
    }
}
