//! Stealth shaping for the automated browser session
//!
//! Injects evasion scripts before navigation and applies CDP-level
//! overrides (user agent, timezone, approximate geolocation) so the
//! headless session's fingerprint resembles an ordinary desktop browser.
//! None of this defeats determined detection; it removes the loudest
//! automation signals.

use anyhow::Result;
use chromiumoxide::{Page, cdp};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use crate::shaper::Fingerprint;

/// Evasion script evaluated on every new document before page scripts run.
///
/// Covers the classic automation tells: the `navigator.webdriver` flag,
/// empty plugin/language lists, the missing `window.chrome` runtime, the
/// headless outer-dimension mismatch, and the permissions API shortcut.
const EVASION_SCRIPT: &str = r"
Object.defineProperty(navigator, 'webdriver', {
    get: () => undefined,
    configurable: true
});
Object.defineProperty(navigator, 'plugins', {
    get: () => [
        {name: 'Chrome PDF Plugin', filename: 'internal-pdf-viewer'},
        {name: 'Chrome PDF Viewer', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai'},
        {name: 'Native Client', filename: 'internal-nacl-plugin'}
    ]
});
Object.defineProperty(navigator, 'languages', {
    get: () => ['en-US', 'en', 'es']
});
Object.defineProperty(navigator, 'permissions', {
    get: () => ({ query: () => Promise.resolve({state: 'granted'}) })
});
window.chrome = {
    runtime: {},
    loadTimes: function() { return {}; },
    csi: function() { return {}; }
};
Object.defineProperty(window, 'outerHeight', { get: () => window.innerHeight });
Object.defineProperty(window, 'outerWidth', { get: () => window.innerWidth });
";

/// Apply stealth overrides to a blank page before navigation.
///
/// Script injection must happen while the page is still `about:blank`;
/// `AddScriptToEvaluateOnNewDocument` then re-applies it on the navigation
/// that follows.
pub async fn prepare_page(page: &Page, fingerprint: &Fingerprint) -> Result<()> {
    debug!("injecting stealth evasion script");

    page.execute(
        cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams {
            source: EVASION_SCRIPT.to_string(),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        },
    )
    .await?;

    // Network-level user agent, stripped of any Headless marker
    let user_agent = fingerprint.user_agent.replace("Headless", "");
    page.execute(
        cdp::browser_protocol::network::SetUserAgentOverrideParams {
            user_agent,
            accept_language: Some(fingerprint.accept_language.clone()),
            platform: Some(fingerprint.platform.to_string()),
            user_agent_metadata: None,
        },
    )
    .await?;

    // Timezone and jittered geolocation consistent with a US desktop session
    page.execute(
        cdp::browser_protocol::emulation::SetTimezoneOverrideParams::builder()
            .timezone_id("America/New_York")
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await?;

    // Rng drawn in a scope so the non-Send handle is gone before the await
    let (latitude, longitude) = {
        let mut rng = rand::rng();
        (
            40.7128 + rng.random_range(-0.1..0.1),
            -74.0060 + rng.random_range(-0.1..0.1),
        )
    };
    let mut geolocation =
        cdp::browser_protocol::emulation::SetGeolocationOverrideParams::default();
    geolocation.latitude = Some(latitude);
    geolocation.longitude = Some(longitude);
    geolocation.accuracy = Some(100.0);
    if let Err(e) = page.execute(geolocation).await {
        // Geolocation override is best-effort; some targets never query it
        warn!("geolocation override failed: {e}");
    }

    Ok(())
}

/// Emit low-cost human-like signals before extraction: a couple of random
/// scroll offsets, a synthetic pointer move, and short randomized pauses.
pub async fn simulate_human(page: &Page) {
    let (offsets, pauses): ([i64; 2], [u64; 3]) = {
        let mut rng = rand::rng();
        (
            [rng.random_range(150..500), rng.random_range(500..1100)],
            [
                rng.random_range(400..1400),
                rng.random_range(400..1400),
                rng.random_range(800..2200),
            ],
        )
    };

    for (offset, pause) in offsets.iter().zip(pauses.iter()) {
        if let Err(e) = page
            .evaluate(format!("window.scrollTo(0, {offset});"))
            .await
        {
            debug!("scroll simulation failed: {e}");
            return;
        }
        tokio::time::sleep(Duration::from_millis(*pause)).await;
    }

    let pointer_move = "\
        const event = new MouseEvent('mousemove', {\
            clientX: Math.random() * window.innerWidth,\
            clientY: Math.random() * window.innerHeight\
        });\
        document.dispatchEvent(event);";
    if let Err(e) = page.evaluate(pointer_move).await {
        debug!("pointer simulation failed: {e}");
    }

    tokio::time::sleep(Duration::from_millis(pauses[2])).await;
}
