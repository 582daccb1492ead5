//! Filtering of non-competable authority domains from organic results
//!
//! Raw SERPs are dominated by platforms no SEO client can outrank (social
//! networks, marketplaces, government sites). Downstream competitive
//! analysis only wants realistic competitors, so those domains are dropped
//! before results leave the engine. The classification is curated data, not
//! derived at runtime, and can be swapped wholesale via [`AuthorityDomainSet::from_entries`].

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::query::OrganicResult;

/// Fewest realistic competitors a query is expected to keep
pub const MIN_COMPETITORS: usize = 5;

/// Most realistic competitors retained per query
pub const MAX_COMPETITORS: usize = 10;

/// Curated entries; a leading dot marks a suffix rule (`.gov`)
const DEFAULT_ENTRIES: &[&str] = &[
    // Social networks
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "tiktok.com",
    "pinterest.com",
    "snapchat.com",
    // Video and streaming platforms
    "youtube.com",
    "vimeo.com",
    "twitch.tv",
    "netflix.com",
    "hulu.com",
    // E-commerce giants
    "amazon.com",
    "amazon.es",
    "amazon.co.uk",
    "ebay.com",
    "ebay.es",
    "mercadolibre.com",
    "alibaba.com",
    "etsy.com",
    // Reference authority
    "wikipedia.org",
    "reddit.com",
    "quora.com",
    "stackoverflow.com",
    // Entertainment databases
    "imdb.com",
    "rottentomatoes.com",
    "metacritic.com",
    // Tech giants
    "google.com",
    "microsoft.com",
    "apple.com",
    "github.com",
    // Government and education suffixes
    ".gov",
    ".edu",
    ".mil",
    "europa.eu",
    "who.int",
    "unicef.org",
    // Travel platforms
    "booking.com",
    "expedia.com",
    "airbnb.com",
];

/// Static classification of domains too authoritative to compete with
#[derive(Debug, Clone)]
pub struct AuthorityDomainSet {
    exact: HashSet<String>,
    suffixes: Vec<String>,
}

impl AuthorityDomainSet {
    /// Build a set from raw entries; leading-dot entries become suffix rules
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut exact = HashSet::new();
        let mut suffixes = Vec::new();
        for entry in entries {
            let entry = entry.as_ref().trim().to_lowercase();
            if entry.is_empty() {
                continue;
            }
            if entry.starts_with('.') {
                suffixes.push(entry);
            } else {
                exact.insert(entry);
            }
        }
        Self { exact, suffixes }
    }

    /// Whether a (www-stripped) domain is non-competable.
    ///
    /// Matches the domain itself, any subdomain of an exact entry, and the
    /// bare suffix rules.
    #[must_use]
    pub fn is_authority(&self, domain: &str) -> bool {
        let domain = domain.trim().to_lowercase();
        if domain.is_empty() {
            return false;
        }
        if self.exact.contains(&domain) {
            return true;
        }
        if self
            .exact
            .iter()
            .any(|known| domain.ends_with(&format!(".{known}")))
        {
            return true;
        }
        self.suffixes.iter().any(|suffix| domain.ends_with(suffix))
    }

    /// Walk ranked results in order, dropping authority domains and keeping
    /// at most `max_keep` realistic competitors.
    ///
    /// Original positions are preserved, not renumbered — rank information
    /// stays meaningful to consumers.
    #[must_use]
    pub fn filter(
        &self,
        results: Vec<OrganicResult>,
        min_keep: usize,
        max_keep: usize,
    ) -> Vec<OrganicResult> {
        let total = results.len();
        let mut kept = Vec::new();

        for result in results {
            if self.is_authority(&result.domain) {
                debug!(domain = %result.domain, "skipping high-authority domain");
                continue;
            }
            kept.push(result);
            if kept.len() >= max_keep {
                break;
            }
        }

        if kept.len() < min_keep {
            warn!(
                kept = kept.len(),
                min_keep, total, "fewer realistic competitors than expected"
            );
        }

        kept
    }
}

impl Default for AuthorityDomainSet {
    fn default() -> Self {
        Self::from_entries(DEFAULT_ENTRIES.iter().copied())
    }
}
