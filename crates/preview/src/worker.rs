//! The extraction worker: one URL, one fresh browser, one preview message.
//!
//! Runs inside the supervisor's isolated task. A fresh Chromium is launched
//! per request and torn down with it, so a wedged or crashed engine never
//! outlives its request.

use {
    chromiumoxide::{
        Browser, BrowserConfig, Page,
        cdp::browser_protocol::{
            input::{DispatchMouseEventParams, DispatchMouseEventType},
            page::CaptureScreenshotFormat,
        },
    },
    futures::StreamExt,
    tokio::time::{Duration, timeout},
    tracing::{debug, info},
};

use {
    crate::{
        detect, document,
        error::ExtractError,
        fetch::{self, FetchedDocument},
        probe, rules, stealth,
        types::ExtractOptions,
    },
    unfurl_format::strip_newlines,
};

/// Produce the preview message for one URL.
///
/// Every failure resolves to an `ExtractError`; nothing in here panics.
pub async fn extract(url: &str, opts: &ExtractOptions) -> Result<String, ExtractError> {
    let (mut browser, page) = launch(opts).await?;
    let result = run(&page, url, opts).await;

    if browser.close().await.is_err() {
        debug!("browser close failed");
    }
    result
}

async fn launch(opts: &ExtractOptions) -> Result<(Browser, Page), ExtractError> {
    let executable = detect::find_chromium(opts.chrome_path.as_deref())
        .ok_or(ExtractError::BrowserNotAvailable)?;

    let mut builder = BrowserConfig::builder();

    // chromiumoxide runs headless unless told otherwise.
    if !opts.headless {
        builder = builder.with_head();
    }

    // Fixed desktop width, jittered height: a constant viewport is itself a
    // fingerprint.
    let viewport_height = 720 + stealth::jitter(0, 99) as u32;
    builder = builder
        .viewport(chromiumoxide::handler::viewport::Viewport {
            width: 1280,
            height: viewport_height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: true,
            has_touch: false,
        })
        .request_timeout(Duration::from_secs(30))
        .chrome_executable(&executable)
        .arg(format!("--user-agent={}", opts.user_agent))
        .arg(format!("--lang={}", opts.locale))
        .arg("--disable-gpu")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-software-rasterizer")
        .arg("--no-sandbox")
        .arg("--disable-setuid-sandbox");

    let config = builder
        .build()
        .map_err(|e| ExtractError::LaunchFailed(format!("failed to build browser config: {e}")))?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        ExtractError::LaunchFailed(format!("{e}\n\n{}", detect::install_instructions()))
    })?;

    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(error) = event {
                debug!(%error, "browser event stream closed");
                break;
            }
        }
    });

    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| ExtractError::LaunchFailed(e.to_string()))?;
    stealth::prepare(&page, opts).await?;

    debug!(
        executable = %executable.display(),
        viewport_height,
        headless = opts.headless,
        "browser launched"
    );
    Ok((browser, page))
}

async fn run(page: &Page, url: &str, opts: &ExtractOptions) -> Result<String, ExtractError> {
    let client = fetch::client(&opts.user_agent, opts.nav_timeout)?;

    // Navigation gets one bounded attempt; a protocol-level failure (raw
    // binary, dead renderer) demotes the request to an unrendered fetch.
    let nav_result = match timeout(opts.nav_timeout, navigate(page, url)).await {
        Ok(result) => result,
        Err(_) => Err(ExtractError::navigation(
            url,
            format!("navigation timed out after {}ms", opts.nav_timeout.as_millis()),
        )),
    };

    let mut document: Option<FetchedDocument> = None;
    if let Err(error) = nav_result {
        debug!(url, %error, "navigation failed, trying document fetch");
        let fetched = fetch::fetch_document(&client, url)
            .await
            .map_err(|e| ExtractError::navigation(url, e.to_string()))?;
        document = Some(fetched);
    }
    let rendered = document.is_none();

    if rendered {
        humanize(page).await?;
        page.reload()
            .await
            .map_err(|e| ExtractError::Cdp(e.to_string()))?;
        let _ = page.wait_for_navigation().await;
    }

    let content_type = match &document {
        Some(doc) => doc.content_type.clone(),
        None => probe::declared_content_type(page).await.unwrap_or_default(),
    };
    let basename = document::url_basename(url);

    // Documents are described from metadata; no DOM heuristics afterwards.
    if document::is_pdf(&content_type) || document::is_office_document(&content_type) {
        let body = document_body(&client, url, document).await?;
        let message = if document::is_pdf(&content_type) {
            document::describe_pdf(&body, basename).await?
        } else {
            document::describe_office(&body, basename).await?
        };
        write_artifacts(page, opts).await;
        info!(url, content_type = %content_type, "document preview extracted");
        return Ok(strip_newlines(&message));
    }

    let page_title = probe::page_title(page).await;

    let message = if rendered {
        match rules::apply(page, url, &page_title, opts.rule_wait).await {
            Some(message) => message,
            None => format!("[ {page_title} ]"),
        }
    } else {
        // The page never loaded, so the fetched body is all there is.
        let title = document
            .as_ref()
            .and_then(|doc| std::str::from_utf8(&doc.body).ok())
            .and_then(fetch::title_from_html)
            .unwrap_or_else(|| basename.to_string());
        format!("[ {title} ]")
    };

    write_artifacts(page, opts).await;
    info!(url, "preview extracted");
    Ok(strip_newlines(&message))
}

async fn navigate(page: &Page, url: &str) -> Result<(), ExtractError> {
    page.goto(url)
        .await
        .map_err(|e| ExtractError::navigation(url, e.to_string()))?;
    let _ = page.wait_for_navigation().await;

    // Chromium reports some failures as a successful navigation to an error
    // page instead of a command error.
    let settled = page.url().await.ok().flatten().unwrap_or_default();
    if settled.is_empty() || settled == "about:blank" || settled.starts_with("chrome-error://") {
        return Err(ExtractError::navigation(url, "page never loaded"));
    }
    Ok(())
}

/// Cursor drift, a scroll, and irregular pauses before the reload; bot
/// checks watch for pages that load and never move.
async fn humanize(page: &Page) -> Result<(), ExtractError> {
    move_mouse(page, 100.0, 100.0).await?;
    stealth::human_pause(500, 1500).await;
    move_mouse(page, 200.0, 300.0).await?;
    stealth::human_pause(500, 1500).await;
    page.evaluate("window.scrollBy(0, window.innerHeight / 2); true")
        .await
        .map_err(|e| ExtractError::JsEvalFailed(e.to_string()))?;
    stealth::human_pause(1000, 2000).await;
    Ok(())
}

async fn move_mouse(page: &Page, x: f64, y: f64) -> Result<(), ExtractError> {
    let cmd = DispatchMouseEventParams::builder()
        .r#type(DispatchMouseEventType::MouseMoved)
        .x(x)
        .y(y)
        .build()
        .map_err(|e| ExtractError::Cdp(e.to_string()))?;
    page.execute(cmd).await?;
    Ok(())
}

async fn document_body(
    client: &reqwest::Client,
    url: &str,
    document: Option<FetchedDocument>,
) -> Result<Vec<u8>, ExtractError> {
    match document {
        Some(doc) => Ok(doc.body),
        // Rendered mode never held the bytes; fetch them now.
        None => Ok(fetch::fetch_document(client, url).await?.body),
    }
}

/// Best-effort diagnostic snapshot, overwritten per extraction.
async fn write_artifacts(page: &Page, opts: &ExtractOptions) {
    let screenshot = timeout(
        Duration::from_secs(10),
        page.screenshot(
            chromiumoxide::page::ScreenshotParams::builder()
                .format(CaptureScreenshotFormat::Png)
                .full_page(true)
                .build(),
        ),
    )
    .await;

    match screenshot {
        Ok(Ok(bytes)) => {
            let path = opts.artifact_dir.join("screenshot.png");
            if let Err(error) = tokio::fs::write(&path, bytes).await {
                debug!(%error, "screenshot write failed");
            }
        },
        Ok(Err(error)) => debug!(%error, "screenshot capture failed"),
        Err(_) => debug!("screenshot timed out"),
    }

    match page.content().await {
        Ok(html) => {
            let path = opts.artifact_dir.join("html.txt");
            if let Err(error) = tokio::fs::write(&path, html).await {
                debug!(%error, "html dump write failed");
            }
        },
        Err(error) => debug!(%error, "html dump failed"),
    }
}
