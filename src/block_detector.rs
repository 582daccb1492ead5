//! Classification of responses as blocked or served normally
//!
//! A pure disjunction over independent signals: any single positive is
//! enough. Missing a block costs far more than aborting a still-valid page,
//! so there is no weighting or scoring here.

/// Redirect paths the engine lands on when challenged
const BLOCKED_URL_FRAGMENTS: &[&str] = &["/sorry/", "captcha", "/search/howsearchworks"];

/// Body phrases that identify a challenge or interstitial page
const BLOCK_PHRASES: &[&str] = &[
    "unusual traffic",
    "captcha",
    "blocked",
    "detected unusual",
    "verify you are human",
    "please enable javascript",
];

/// Decide whether a response was rejected by anti-automation defenses.
///
/// `final_url` is the URL actually landed on after redirects; `status` the
/// HTTP status code; `body` the raw response text (may be empty when only
/// URL/status are known, e.g. before a browser page has settled).
#[must_use]
pub fn is_blocked(final_url: &str, status: u16, body: &str) -> bool {
    if status == 429 {
        return true;
    }

    let url = final_url.to_lowercase();
    if BLOCKED_URL_FRAGMENTS.iter().any(|frag| url.contains(frag)) {
        return true;
    }

    let body = body.to_lowercase();
    BLOCK_PHRASES.iter().any(|phrase| body.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorry_redirect_is_blocked_regardless_of_rest() {
        assert!(is_blocked(
            "https://www.google.com/sorry/index?continue=x",
            200,
            "<html>perfectly normal body</html>"
        ));
    }

    #[test]
    fn status_429_is_blocked() {
        assert!(is_blocked("https://google.com/search?q=x", 429, ""));
    }

    #[test]
    fn captcha_phrase_in_body_is_blocked() {
        assert!(is_blocked(
            "https://google.com/search?q=x",
            200,
            "Our systems have detected unusual traffic from your network"
        ));
        assert!(is_blocked(
            "https://google.com/search?q=x",
            200,
            "Please solve this CAPTCHA to continue"
        ));
    }

    #[test]
    fn temporarily_blocked_notice_is_blocked() {
        assert!(is_blocked(
            "https://www.google.com/search?q=shoes",
            200,
            "<html>Your IP address has been temporarily blocked.</html>"
        ));
    }

    #[test]
    fn normal_page_is_not_blocked() {
        assert!(!is_blocked(
            "https://google.com/search?q=running+shoes",
            200,
            "<html><div class=\"g\">result</div></html>"
        ));
    }

    #[test]
    fn checks_are_case_insensitive() {
        assert!(is_blocked("https://google.com/SORRY/page", 200, ""));
        assert!(is_blocked("https://google.com/search", 200, "UNUSUAL TRAFFIC"));
    }
}
