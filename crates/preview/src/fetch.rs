//! Unrendered HTTP fetches.
//!
//! Two callers: the worker's document-mode fallback when navigation fails
//! (raw binaries, direct downloads), and the wire-service pre-check that
//! tries a plain `<title>` read before paying for a full browser run.

use {
    reqwest::header,
    scraper::{Html, Selector},
    tokio::time::Duration,
};

use crate::error::ExtractError;

/// A body fetched without rendering, plus its declared content type.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Build the client used for unrendered fetches. Same user agent as the
/// browser so both faces of the worker look identical to the site.
pub fn client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, ExtractError> {
    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .build()?)
}

/// Fetch a URL without rendering it. HTTP error statuses are not failures
/// here; callers care about the declared content type and the bytes.
pub async fn fetch_document(
    client: &reqwest::Client,
    url: &str,
) -> Result<FetchedDocument, ExtractError> {
    let response = client.get(url).send().await?;
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = response.bytes().await?.to_vec();
    Ok(FetchedDocument { content_type, body })
}

/// Fetch a page and read its `<title>` without a browser.
///
/// Returns `Ok(None)` on a non-success status or a missing/empty title, so
/// the caller can fall through to the full pipeline.
pub async fn fetch_page_title(
    client: &reqwest::Client,
    url: &str,
) -> Result<Option<String>, ExtractError> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Ok(None);
    }
    let body = response.text().await?;
    Ok(title_from_html(&body))
}

/// Extract the text of the first `<title>` element.
pub fn title_from_html(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    let title = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())?;
    let title = title.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn document_fetch_keeps_content_type_and_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/report.pdf")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(b"%PDF-1.7 fake")
            .create_async()
            .await;

        let client = client("test-agent", Duration::from_secs(5)).unwrap();
        let url = format!("{}/report.pdf", server.url());
        let doc = fetch_document(&client, &url).await.unwrap();

        assert_eq!(doc.content_type, "application/pdf");
        assert_eq!(doc.body, b"%PDF-1.7 fake");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn title_fetch_reads_title_tag() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/story")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body("<html><head><title> Markets rally </title></head><body></body></html>")
            .create_async()
            .await;

        let client = client("test-agent", Duration::from_secs(5)).unwrap();
        let url = format!("{}/story", server.url());
        let title = fetch_page_title(&client, &url).await.unwrap();

        assert_eq!(title.as_deref(), Some("Markets rally"));
    }

    #[tokio::test]
    async fn title_fetch_is_none_on_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/story")
            .with_status(403)
            .with_body("<html><head><title>Denied</title></head></html>")
            .create_async()
            .await;

        let client = client("test-agent", Duration::from_secs(5)).unwrap();
        let url = format!("{}/story", server.url());
        let title = fetch_page_title(&client, &url).await.unwrap();

        assert!(title.is_none());
    }

    #[test]
    fn title_from_html_handles_missing_and_empty() {
        assert_eq!(title_from_html("<html><body>no title</body></html>"), None);
        assert_eq!(title_from_html("<title>   </title>"), None);
        assert_eq!(
            title_from_html("<title>A &amp; B</title>").as_deref(),
            Some("A & B")
        );
    }
}
