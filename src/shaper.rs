//! Anti-detection request shaping
//!
//! Produces a randomized but internally consistent browser fingerprint per
//! attempt: a real user-agent signature, the Accept family derived from the
//! target country, and client-hint headers added with some probability so
//! the header set itself doesn't become a uniform signature. Nothing here
//! guarantees evasion; it only removes the most common automated-traffic
//! tells.

use rand::Rng;
use rand::seq::IndexedRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

use crate::locale::CountryConfig;

/// Real, current desktop browser signatures rotated per attempt
pub const USER_AGENTS: &[&str] = &[
    // Chrome Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    // Chrome macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    // Chrome Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    // Firefox Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/119.0",
    // Safari macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// Common desktop window sizes for the browser strategy
pub const VIEWPORTS: &[(u32, u32)] = &[(1920, 1080), (1366, 768), (1440, 900), (1536, 864)];

/// One attempt's browser identity, shared between headers and CDP overrides
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub user_agent: String,
    pub accept_language: String,
    pub viewport: (u32, u32),
    /// Platform string reported through client hints and CDP
    pub platform: &'static str,
}

/// Header map plus the fingerprint that produced it
#[derive(Debug, Clone)]
pub struct ShapedRequest {
    pub headers: HeaderMap,
    pub fingerprint: Fingerprint,
}

/// Stateless fingerprint generator; every call draws fresh randomness
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestShaper;

impl RequestShaper {
    /// Produce headers and a fingerprint for one attempt against `country`
    #[must_use]
    pub fn shape(&self, country: &CountryConfig) -> ShapedRequest {
        let mut rng = rand::rng();

        let user_agent = USER_AGENTS
            .choose(&mut rng)
            .copied()
            .unwrap_or(USER_AGENTS[0])
            .to_string();
        let viewport = VIEWPORTS.choose(&mut rng).copied().unwrap_or((1920, 1080));
        let accept_language = format!(
            "{hl}-{gl},{hl};q=0.9,en;q=0.8",
            hl = country.hl,
            gl = country.gl.to_ascii_uppercase()
        );
        let platform = ["Windows", "macOS", "Linux"]
            .choose(&mut rng)
            .copied()
            .unwrap_or("Windows");

        let mut headers = HeaderMap::new();
        insert(&mut headers, "User-Agent", &user_agent);
        insert(
            &mut headers,
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        );
        insert(&mut headers, "Accept-Language", &accept_language);
        insert(&mut headers, "Upgrade-Insecure-Requests", "1");
        insert(&mut headers, "Sec-Fetch-Dest", "document");
        insert(&mut headers, "Sec-Fetch-Mode", "navigate");
        insert(&mut headers, "Sec-Fetch-Site", "none");
        insert(&mut headers, "Sec-Fetch-User", "?1");
        insert(&mut headers, "Cache-Control", "max-age=0");
        insert(&mut headers, "DNT", "1");

        // Client hints only sometimes, so the header set itself varies
        if rng.random_bool(0.5) {
            insert(
                &mut headers,
                "Sec-CH-UA",
                "\"Google Chrome\";v=\"119\", \"Chromium\";v=\"119\", \"Not?A_Brand\";v=\"24\"",
            );
            insert(&mut headers, "Sec-CH-UA-Mobile", "?0");
            insert(&mut headers, "Sec-CH-UA-Platform", &format!("\"{platform}\""));
        }

        trace!(user_agent, accept_language, "shaped request fingerprint");

        ShapedRequest {
            headers,
            fingerprint: Fingerprint {
                user_agent,
                accept_language,
                viewport,
                platform,
            },
        }
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let (Ok(name), Ok(value)) = (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        headers.insert(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::country_config;

    #[test]
    fn shape_uses_a_known_user_agent() {
        let shaped = RequestShaper.shape(country_config("US"));
        assert!(USER_AGENTS.contains(&shaped.fingerprint.user_agent.as_str()));
        assert_eq!(
            shaped.headers.get("User-Agent").unwrap().to_str().unwrap(),
            shaped.fingerprint.user_agent
        );
    }

    #[test]
    fn accept_language_tracks_country() {
        let shaped = RequestShaper.shape(country_config("DE"));
        assert!(shaped.fingerprint.accept_language.starts_with("de-DE"));
        let shaped = RequestShaper.shape(country_config("MX"));
        assert!(shaped.fingerprint.accept_language.starts_with("es-MX"));
    }

    #[test]
    fn viewport_is_from_the_pool() {
        let shaped = RequestShaper.shape(country_config("US"));
        assert!(VIEWPORTS.contains(&shaped.fingerprint.viewport));
    }
}
