//! Anti-automation-detection countermeasures.
//!
//! Sites that gate content behind bot checks look at `navigator.webdriver`,
//! the `window.chrome` object, plugin and language surfaces, and interaction
//! timing. The init script papers over the first four before any page script
//! runs; [`human_pause`] covers the last.

use {
    chromiumoxide::{
        Page,
        cdp::browser_protocol::{
            emulation::SetTimezoneOverrideParams, page::AddScriptToEvaluateOnNewDocumentParams,
        },
    },
    rand::Rng,
    tokio::time::Duration,
    tracing::debug,
};

use crate::{error::ExtractError, types::ExtractOptions};

/// Script injected into every new document before page scripts run.
///
/// The language list is derived from the configured locale so the JS surface
/// agrees with the Accept-Language the browser sends.
pub fn init_script(locale: &str) -> String {
    let primary = locale.split('-').next().unwrap_or(locale);
    format!(
        r#"
Object.defineProperty(navigator, 'webdriver', {{ get: () => undefined }});
if (!window.chrome) {{
    window.chrome = {{ runtime: {{}} }};
}}
Object.defineProperty(navigator, 'languages', {{ get: () => ['{locale}', '{primary}'] }});
Object.defineProperty(navigator, 'plugins', {{ get: () => [1, 2, 3, 4, 5] }});
const originalQuery = window.navigator.permissions.query;
window.navigator.permissions.query = (parameters) =>
    parameters.name === 'notifications'
        ? Promise.resolve({{ state: Notification.permission }})
        : originalQuery(parameters);
"#
    )
}

/// Apply the init script and timezone override to a fresh page.
///
/// Must run before the first navigation; the script only covers documents
/// created after it is registered.
pub async fn prepare(page: &Page, opts: &ExtractOptions) -> Result<(), ExtractError> {
    let script = AddScriptToEvaluateOnNewDocumentParams::builder()
        .source(init_script(&opts.locale))
        .build()
        .map_err(|e| ExtractError::Cdp(e.to_string()))?;
    page.execute(script).await?;

    let tz = SetTimezoneOverrideParams::builder()
        .timezone_id(&opts.timezone)
        .build()
        .map_err(|e| ExtractError::Cdp(e.to_string()))?;
    page.execute(tz).await?;

    debug!(locale = %opts.locale, timezone = %opts.timezone, "page prepared");
    Ok(())
}

/// Sleep a uniformly random duration between the two bounds, in milliseconds.
pub async fn human_pause(lo_ms: u64, hi_ms: u64) {
    tokio::time::sleep(Duration::from_millis(jitter(lo_ms, hi_ms))).await;
}

/// Uniform random value in `lo..=hi`.
pub fn jitter(lo: u64, hi: u64) -> u64 {
    if lo >= hi {
        return lo;
    }
    let mut rng = rand::rng();
    rng.random_range(lo..=hi)
}
