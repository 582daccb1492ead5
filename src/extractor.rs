//! Resilient SERP markup extraction
//!
//! The target site reshuffles its markup regularly, so nothing here relies
//! on a single selector. Every element of interest is located through an
//! ordered list of selectors evaluated first-match-wins: the organic-result
//! container cascade stops at the first selector yielding a minimum number
//! of elements, and title/url/snippet each have their own fallback lists.
//! Broken elements are skipped, never fatal.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::query::{
    FeaturedSnippet, MAX_PEOPLE_ALSO_ASK, MAX_RELATED_SEARCHES, OrganicResult, RESULTS_PER_PAGE,
};

/// A container selector must match at least this many elements to win
pub const MIN_CONTAINER_MATCHES: usize = 3;

fn parse_all(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
}

/// Organic-result containers, newest layout first
static CONTAINER_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    parse_all(&[
        "div.g:not(.g-blk):not(.kp-blk)",
        "div.MjjYud",
        "div.yuRUbf",
        "div[data-ved][jscontroller]",
        ".rc",
    ])
});

static TITLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    parse_all(&[
        "h3",
        ".LC20lb",
        "[role=\"heading\"]",
        ".DKV0Md",
        ".BNeawe.vvjwJb.AP7Wnd",
    ])
});

static LINK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    parse_all(&[
        "a[href^=\"http\"]",
        "a[href^=\"/url?q=http\"]",
        "a[href]",
    ])
});

static SNIPPET_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    parse_all(&[
        ".VwiC3b",
        ".s3v9rd",
        ".st",
        "[data-content-feature=\"1\"]",
        ".IsZvec",
        ".BNeawe.s3v9rd.AP7Wnd",
        ".hgKElc",
    ])
});

static FEATURED_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    parse_all(&[
        ".xpdopen .hgKElc",
        ".g .kp-blk",
        ".UDZeY",
        ".IThcWe",
        ".kp-blk .Uo8X3b",
    ])
});

static PAA_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    parse_all(&[
        ".related-question-pair",
        ".cbphWd",
        "[jsname=\"Cpkphb\"]",
        ".JlqpRe",
    ])
});

static RELATED_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    parse_all(&[".k8XOCe", ".s75CSd", ".AuVD", ".BNeawe.UPmit.AP7Wnd"])
});

/// Everything recovered from one result page
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub organic: Vec<OrganicResult>,
    pub featured_snippet: Option<FeaturedSnippet>,
    pub people_also_ask: Vec<String>,
    pub related_searches: Vec<String>,
}

/// Extract a page of results from raw HTML.
///
/// Positions are assigned sequentially from `position_offset + 1`,
/// advancing only for elements that yield both a title and a usable URL —
/// partial elements are skipped without consuming a rank. Auxiliary widgets
/// are only looked for when `first_page` is set.
#[must_use]
pub fn extract_page(
    html: &str,
    engine_domain: &str,
    first_page: bool,
    position_offset: usize,
) -> PageExtraction {
    let document = Html::parse_document(html);
    let mut extraction = PageExtraction {
        organic: extract_organic(&document, engine_domain, position_offset),
        ..Default::default()
    };

    if first_page {
        extraction.featured_snippet = extract_featured_snippet(&document);
        extraction.people_also_ask = extract_people_also_ask(&document);
        extraction.related_searches = extract_related_searches(&document);
    }

    extraction
}

fn extract_organic(
    document: &Html,
    engine_domain: &str,
    position_offset: usize,
) -> Vec<OrganicResult> {
    let mut results = Vec::new();

    let containers = match first_matching_containers(document) {
        Some(containers) => containers,
        None => {
            warn!("no organic-result container selector matched the page");
            return results;
        }
    };

    let mut position = position_offset + 1;
    for element in containers.into_iter().take(RESULTS_PER_PAGE) {
        let url = match extract_url(element, engine_domain) {
            Some(url) => url,
            None => continue,
        };
        let title = match first_text(element, &TITLE_SELECTORS, 1) {
            Some(title) => title,
            None => continue,
        };
        let snippet = first_text(element, &SNIPPET_SELECTORS, 1).unwrap_or_default();
        let domain = domain_of(&url);

        results.push(OrganicResult {
            position,
            title,
            url,
            snippet,
            domain,
        });
        position += 1;
    }

    debug!(count = results.len(), "extracted organic results");
    results
}

/// First container selector that matches at least [`MIN_CONTAINER_MATCHES`]
fn first_matching_containers(document: &Html) -> Option<Vec<ElementRef<'_>>> {
    for selector in CONTAINER_SELECTORS.iter() {
        let elements: Vec<ElementRef<'_>> = document.select(selector).collect();
        if elements.len() >= MIN_CONTAINER_MATCHES {
            return Some(elements);
        }
    }
    None
}

/// First selector in the list yielding text of at least `min_len` chars
fn first_text(element: ElementRef<'_>, selectors: &[Selector], min_len: usize) -> Option<String> {
    for selector in selectors {
        if let Some(found) = element.select(selector).next() {
            let text: String = found.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.len() >= min_len {
                return Some(text);
            }
        }
    }
    None
}

fn extract_url(element: ElementRef<'_>, engine_domain: &str) -> Option<String> {
    for selector in LINK_SELECTORS.iter() {
        for link in element.select(selector) {
            if let Some(href) = link.value().attr("href") {
                if let Some(url) = clean_result_url(href, engine_domain) {
                    return Some(url);
                }
            }
        }
    }
    None
}

/// Unwrap redirect-wrapper links, decode, and reject engine-internal URLs
#[must_use]
pub fn clean_result_url(href: &str, engine_domain: &str) -> Option<String> {
    let mut url = href.to_string();

    // Redirect wrapper: /url?q=https%3A%2F%2F...&sa=...
    if let Some(rest) = url.split("/url?q=").nth(1) {
        let wrapped = rest.split('&').next().unwrap_or(rest);
        url = urlencoding::decode(wrapped).ok()?.into_owned();
    }

    if !url.starts_with("http") {
        return None;
    }

    let parsed = Url::parse(&url).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    if is_engine_host(&host, engine_domain) {
        return None;
    }

    Some(url)
}

/// Whether a host belongs to the search engine rather than a result
fn is_engine_host(host: &str, engine_domain: &str) -> bool {
    let engine = engine_domain.to_lowercase();
    host == engine
        || host.ends_with(&format!(".{engine}"))
        || host == "google.com"
        || host.ends_with(".google.com")
        || host.ends_with("googleusercontent.com")
}

/// Destination host with any `www.` prefix stripped
#[must_use]
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .map(|host| host.strip_prefix("www.").map(str::to_string).unwrap_or(host))
        .unwrap_or_default()
}

fn extract_featured_snippet(document: &Html) -> Option<FeaturedSnippet> {
    for selector in FEATURED_SELECTORS.iter() {
        if let Some(element) = document.select(selector).next() {
            let text: String = element.text().collect::<Vec<_>>().join(" ");
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.len() > 20 {
                return Some(FeaturedSnippet {
                    text,
                    source: "Featured Snippet".to_string(),
                });
            }
        }
    }
    None
}

fn extract_people_also_ask(document: &Html) -> Vec<String> {
    for selector in PAA_SELECTORS.iter() {
        let questions: Vec<String> = document
            .select(selector)
            .filter_map(|element| {
                let text: String = element.text().collect::<Vec<_>>().join(" ");
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                (text.contains('?') && text.len() > 10).then_some(text)
            })
            .take(MAX_PEOPLE_ALSO_ASK)
            .collect();
        if !questions.is_empty() {
            return questions;
        }
    }
    Vec::new()
}

fn extract_related_searches(document: &Html) -> Vec<String> {
    for selector in RELATED_SELECTORS.iter() {
        let related: Vec<String> = document
            .select(selector)
            .filter_map(|element| {
                let text: String = element.text().collect::<Vec<_>>().join(" ");
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                (text.len() > 3).then_some(text)
            })
            .take(MAX_RELATED_SEARCHES)
            .collect();
        if !related.is_empty() {
            return related;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_redirect_wrapper_links() {
        let cleaned = clean_result_url(
            "/url?q=https%3A%2F%2Fexample.com%2Fpage&sa=U&ved=abc",
            "google.com",
        );
        assert_eq!(cleaned.as_deref(), Some("https://example.com/page"));
    }

    #[test]
    fn rejects_engine_internal_urls() {
        assert_eq!(
            clean_result_url("https://www.google.com/search?q=more", "google.com"),
            None
        );
        assert_eq!(
            clean_result_url("https://maps.google.com/place", "google.com"),
            None
        );
        assert_eq!(
            clean_result_url("https://google.co.uk/imghp", "google.co.uk"),
            None
        );
    }

    #[test]
    fn rejects_relative_and_schemeless_hrefs() {
        assert_eq!(clean_result_url("/preferences", "google.com"), None);
        assert_eq!(clean_result_url("#fragment", "google.com"), None);
    }

    #[test]
    fn domain_strips_www() {
        assert_eq!(domain_of("https://www.example.com/a"), "example.com");
        assert_eq!(domain_of("https://blog.example.com/a"), "blog.example.com");
        assert_eq!(domain_of("not a url"), "");
    }
}
