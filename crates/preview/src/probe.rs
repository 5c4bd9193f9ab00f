//! DOM probing over a live page.
//!
//! Everything here is JS evaluation: selectors are JSON-quoted into small
//! scripts so untrusted page data never reaches string interpolation raw.
//! Waits poll on a fixed interval instead of subscribing to CDP events; a
//! miss is an [`ExtractError::SelectorTimeout`], which site rules swallow.

use std::time::Instant;

use {
    chromiumoxide::Page,
    tokio::time::{Duration, sleep},
};

use crate::error::ExtractError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wait until `document.querySelector(selector)` matches something.
pub async fn wait_for_selector(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<(), ExtractError> {
    let quoted = quote(selector)?;
    let check = format!("document.querySelector({quoted}) !== null");
    wait_for(page, &check, timeout).await
}

/// Wait until the document title differs from `initial`.
pub async fn wait_for_title_change(
    page: &Page,
    initial: &str,
    timeout: Duration,
) -> Result<(), ExtractError> {
    let quoted = quote(initial)?;
    let check = format!("document.title !== {quoted}");
    wait_for(page, &check, timeout).await
}

async fn wait_for(page: &Page, check_js: &str, timeout: Duration) -> Result<(), ExtractError> {
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        let found: bool = page
            .evaluate(check_js)
            .await
            .map_err(|e| ExtractError::JsEvalFailed(e.to_string()))?
            .into_value()
            .unwrap_or(false);

        if found {
            return Ok(());
        }

        sleep(POLL_INTERVAL).await;
    }

    Err(ExtractError::SelectorTimeout(timeout.as_millis() as u64))
}

/// Inner text of the first element matching `selector`.
pub async fn inner_text(page: &Page, selector: &str) -> Option<String> {
    let quoted = quote(selector).ok()?;
    let js = format!(
        "(() => {{ const el = document.querySelector({quoted}); \
         return el ? el.innerText : null; }})()"
    );
    eval_string(page, &js).await
}

/// Attribute value of the first element matching `selector`.
pub async fn attribute(page: &Page, selector: &str, name: &str) -> Option<String> {
    let quoted_sel = quote(selector).ok()?;
    let quoted_name = quote(name).ok()?;
    let js = format!(
        "(() => {{ const el = document.querySelector({quoted_sel}); \
         return el ? el.getAttribute({quoted_name}) : null; }})()"
    );
    eval_string(page, &js).await
}

/// Content of `<meta property="...">`.
pub async fn meta_content(page: &Page, property: &str) -> Option<String> {
    let selector = format!(r#"meta[property="{property}"]"#);
    attribute(page, &selector, "content").await
}

/// Inner text of the first node matching an XPath expression.
pub async fn xpath_text(page: &Page, expression: &str) -> Option<String> {
    let quoted = quote(expression).ok()?;
    let js = format!(
        "(() => {{ \
         const r = document.evaluate({quoted}, document, null, \
         XPathResult.FIRST_ORDERED_NODE_TYPE, null); \
         const el = r.singleNodeValue; \
         return el ? el.innerText : null; }})()"
    );
    eval_string(page, &js).await
}

/// Current page title, empty string when unavailable.
pub async fn page_title(page: &Page) -> String {
    page.get_title().await.ok().flatten().unwrap_or_default()
}

/// The content type the document reports for itself.
pub async fn declared_content_type(page: &Page) -> Option<String> {
    eval_string(page, "document.contentType").await
}

async fn eval_string(page: &Page, js: &str) -> Option<String> {
    page.evaluate(js)
        .await
        .ok()?
        .into_value::<Option<String>>()
        .ok()
        .flatten()
}

fn quote(s: &str) -> Result<String, ExtractError> {
    serde_json::to_string(s).map_err(|e| ExtractError::JsEvalFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoting_escapes_selector_text() {
        let quoted = quote(r#"div[data-testid*="postThreadItem-by-"]"#).unwrap();
        assert_eq!(quoted, r#""div[data-testid*=\"postThreadItem-by-\"]""#);

        let quoted = quote("it's").unwrap();
        assert_eq!(quoted, r#""it's""#);
    }
}
