//! Site heuristic registry.
//!
//! An ordered table of per-site extraction rules consulted after generic page
//! load. The first rule whose matcher accepts the URL gets one bounded
//! selector wait to find its target; a miss (or an extractor that comes back
//! empty) falls back to the generic page title, never to a hard failure.

use {chromiumoxide::Page, tokio::time::Duration, tracing::debug, url::Url};

use {
    crate::probe,
    unfurl_format::{cap_with_ellipsis, strip_newlines},
};

const TWEET_MEDIA_FALLBACK: &str = "Check the tweet for any attached media.";
const BSKY_MEDIA_FALLBACK: &str = "Check the Bluesky post for any attached media.";

/// One registered heuristic. Matching is host-based except for the archive
/// rule (URL shape) and the paywall rule (also looks at the generic title).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteRule {
    /// fixupx.com status permalinks: Open Graph title and description.
    MicroblogStatus,
    /// x.com / twitter.com profile pages: the displayed user name.
    MicroblogProfile,
    /// Bluesky posts: Open Graph pair under a hard byte cap.
    BlueskyPost,
    /// archive.* snapshots: wait out the interstitial placeholder title.
    ArchiveSnapshot,
    /// ft.com paywall teaser: quote the article blockquote.
    PaywallQuote,
    /// YouTube: fold the channel name into the page title.
    YoutubeVideo,
    /// Instagram posts: image alt text plus the author label.
    InstagramPost,
}

/// Registration order. First match wins, and the order is part of the
/// contract: fixupx.com status pages must be claimed before the generic
/// profile rule sees them.
pub const REGISTRY: &[SiteRule] = &[
    SiteRule::MicroblogStatus,
    SiteRule::MicroblogProfile,
    SiteRule::BlueskyPost,
    SiteRule::ArchiveSnapshot,
    SiteRule::PaywallQuote,
    SiteRule::YoutubeVideo,
    SiteRule::InstagramPost,
];

impl SiteRule {
    pub fn name(self) -> &'static str {
        match self {
            Self::MicroblogStatus => "microblog-status",
            Self::MicroblogProfile => "microblog-profile",
            Self::BlueskyPost => "bluesky-post",
            Self::ArchiveSnapshot => "archive-snapshot",
            Self::PaywallQuote => "paywall-quote",
            Self::YoutubeVideo => "youtube-video",
            Self::InstagramPost => "instagram-post",
        }
    }

    /// Whether this rule applies to the URL. `page_title` is the generic
    /// title read before rules run; only the paywall rule consults it.
    pub fn matches(self, url: &str, page_title: &str) -> bool {
        let host = host_of(url);
        match self {
            Self::MicroblogStatus => host_is(&host, "fixupx.com"),
            Self::MicroblogProfile => host_is(&host, "x.com") || host_is(&host, "twitter.com"),
            Self::BlueskyPost => host.contains("bsky."),
            Self::ArchiveSnapshot => is_archive_url(url),
            Self::PaywallQuote => {
                host_is(&host, "ft.com") && page_title.contains("Subscribe to read")
            },
            Self::YoutubeVideo => host.contains("youtube.com"),
            Self::InstagramPost => host.contains("instagram.com"),
        }
    }
}

/// First rule in registration order that accepts the URL.
pub fn first_match(url: &str, page_title: &str) -> Option<SiteRule> {
    REGISTRY
        .iter()
        .copied()
        .find(|rule| rule.matches(url, page_title))
}

/// Run the first matching rule against the live page.
///
/// `None` means no rule matched or the matched rule found nothing within its
/// wait budget; the caller falls back to the generic title.
pub async fn apply(page: &Page, url: &str, page_title: &str, wait: Duration) -> Option<String> {
    let rule = first_match(url, page_title)?;
    debug!(rule = rule.name(), url, "site rule matched");

    let message = match rule {
        SiteRule::MicroblogStatus => microblog_status(page, wait).await,
        SiteRule::MicroblogProfile => microblog_profile(page, page_title, wait).await,
        SiteRule::BlueskyPost => bluesky_post(page, wait).await,
        SiteRule::ArchiveSnapshot => archive_snapshot(page, url, wait).await,
        SiteRule::PaywallQuote => paywall_quote(page, wait).await,
        SiteRule::YoutubeVideo => youtube_video(page, page_title, wait).await,
        SiteRule::InstagramPost => instagram_post(page, wait).await,
    };

    if message.is_none() {
        debug!(rule = rule.name(), "site rule yielded nothing");
    }
    message
}

async fn microblog_status(page: &Page, wait: Duration) -> Option<String> {
    if let Err(error) = probe::wait_for_selector(page, "article", wait).await {
        debug!(%error, "tweet content never appeared");
        return None;
    }
    let title = scrub_title(&probe::meta_content(page, "og:title").await?);
    let description = match probe::meta_content(page, "og:description").await {
        Some(d) => strip_newlines(&d),
        None => TWEET_MEDIA_FALLBACK.to_string(),
    };
    Some(format!("[ {title}: {description} ]"))
}

async fn microblog_profile(page: &Page, page_title: &str, wait: Duration) -> Option<String> {
    if let Err(error) = probe::wait_for_selector(page, r#"[data-testid="UserName"]"#, wait).await {
        debug!(%error, "profile name never appeared");
        return None;
    }
    let name = probe::inner_text(page, r#"[data-testid="UserName"] > div > div > div > div"#)
        .await
        .unwrap_or_else(|| page_title.to_string());
    Some(format!("[ {name} ]"))
}

async fn bluesky_post(page: &Page, wait: Duration) -> Option<String> {
    let selector = r#"div[data-testid*="postThreadItem-by-"]"#;
    if let Err(error) = probe::wait_for_selector(page, selector, wait).await {
        debug!(%error, "post content never appeared");
        return None;
    }
    let title = strip_newlines(&probe::meta_content(page, "og:title").await?);
    let description = match probe::meta_content(page, "og:description").await {
        Some(d) => strip_newlines(&d),
        None => BSKY_MEDIA_FALLBACK.to_string(),
    };
    Some(cap_post_bytes(&format!("[ {title}: {description} ]")))
}

async fn archive_snapshot(page: &Page, url: &str, wait: Duration) -> Option<String> {
    let placeholder = archive_default_title(url);
    if let Err(error) = probe::wait_for_title_change(page, &placeholder, wait).await {
        debug!(%error, "archive title never settled");
        return None;
    }
    let title = probe::page_title(page).await;
    Some(format!("[ {title} ]"))
}

async fn paywall_quote(page: &Page, wait: Duration) -> Option<String> {
    if let Err(error) = probe::wait_for_selector(page, "blockquote", wait).await {
        debug!(%error, "teaser blockquote never appeared");
        return None;
    }
    let quote = probe::inner_text(page, "blockquote")
        .await
        .unwrap_or_else(|| "Subscribe to read".to_string());
    Some(format!("[ {quote} ]"))
}

async fn youtube_video(page: &Page, page_title: &str, wait: Duration) -> Option<String> {
    if let Err(error) = probe::wait_for_selector(page, "ytd-channel-name a", wait).await {
        debug!(%error, "channel name never appeared");
        return None;
    }
    let mut title = page_title.to_string();
    if let Some(channel) = probe::inner_text(page, "ytd-channel-name a").await {
        title = youtube_retitle(page_title, channel.trim());
        if title.starts_with('-') {
            // Page title carried no video name; recover it from the DOM.
            if let Some(video) = probe::inner_text(page, "#title > h1 > yt-formatted-string").await
            {
                title = format!("{} {title}", video.trim());
            }
        }
    }
    Some(format!("[ {title} ]"))
}

async fn instagram_post(page: &Page, wait: Duration) -> Option<String> {
    if let Err(error) = probe::wait_for_selector(page, "img", wait).await {
        debug!(%error, "post image never appeared");
        return None;
    }
    let description = probe::attribute(page, "img", "alt").await?;
    let author = probe::xpath_text(page, r#"//div[text()="Follow"]/../preceding-sibling::*[1]"#)
        .await
        .unwrap_or_else(|| "Instagram".to_string());
    Some(format!("[ {author}: {description} ]"))
}

// ── Pure text shaping, kept separate so it tests without a browser ──────────

/// Drop CR, LF, and zero-width spaces from a microblog title.
pub fn scrub_title(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\u{200b}'))
        .collect()
}

/// Cap a post message at the transport payload budget: anything 495 UTF-8
/// bytes or longer becomes 447 bytes plus `...`, at most 450 total.
pub fn cap_post_bytes(message: &str) -> String {
    cap_with_ellipsis(message, 495, 447)
}

/// The placeholder title archive.* shows before a snapshot loads: the URL
/// minus its scheme and one trailing slash.
pub fn archive_default_title(url: &str) -> String {
    let s = url.strip_prefix("https://").unwrap_or(url);
    s.strip_suffix('/').unwrap_or(s).to_string()
}

/// Replace a trailing `- YouTube` with `- <channel>`.
pub fn youtube_retitle(page_title: &str, channel: &str) -> String {
    match page_title.strip_suffix("- YouTube") {
        Some(base) => format!("{base}- {channel}"),
        None => page_title.to_string(),
    }
}

fn is_archive_url(url: &str) -> bool {
    url.strip_prefix("https://")
        .unwrap_or(url)
        .starts_with("archive.")
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

fn host_is(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{domain}"))
}
