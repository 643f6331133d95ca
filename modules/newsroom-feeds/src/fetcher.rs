use std::sync::Arc;
use std::time::Duration;

use feed_rs::model::Entry;
use newsroom_common::{RawArticle, Source};
use regex::Regex;
use std::sync::LazyLock;
use tokio::sync::Semaphore;
use tracing::{info, warn};

const DEFAULT_MAX_ITEMS: usize = 10;
const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; newsroom-feeds/0.1; +https://example.invalid/bot)";

static IMG_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img[^>]+src\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

static FEED_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link[^>]+type\s*=\s*["']application/(rss\+xml|atom\+xml)["'][^>]*>"#)
        .expect("valid regex")
});
static FEED_HREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).expect("valid regex"));

/// Feed Fetcher (C2). Fans out across sources with a bounded worker pool;
/// per-source failures are isolated and never abort the overall fetch.
pub struct FeedFetcher {
    client: reqwest::Client,
    workers: usize,
    max_items: usize,
}

impl FeedFetcher {
    pub fn new(workers: usize, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build feed HTTP client");
        Self {
            client,
            workers,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Fetch every source concurrently (bounded by `workers`). `is_known`
    /// is consulted per-entry, in feed order (newest first); the first hit
    /// stops that source's pagination early since older entries beyond a
    /// known one can be assumed already ingested. Callers pass a closure
    /// that normalizes the link before checking, since normalization is
    /// owned by the dedup gate, not the fetcher.
    pub async fn fetch_all<F>(&self, sources: &[Source], is_known: F) -> Vec<RawArticle>
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers.max(1)));
        let is_known = Arc::new(is_known);

        let tasks = sources.iter().cloned().map(|source| {
            let client = self.client.clone();
            let semaphore = Arc::clone(&semaphore);
            let is_known = Arc::clone(&is_known);
            let max_items = self.max_items;
            async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                fetch_one(&client, &source, max_items, is_known.as_ref()).await
            }
        });

        let results = futures::future::join_all(tasks).await;
        results.into_iter().flatten().collect()
    }
}

async fn fetch_one(
    client: &reqwest::Client,
    source: &Source,
    max_items: usize,
    is_known: &(dyn Fn(&str) -> bool + Send + Sync),
) -> Vec<RawArticle> {
    let resp = match client
        .get(&source.feed_url)
        .header("User-Agent", USER_AGENT)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            warn!(source = %source.name, error = %e, "feed fetch failed");
            return Vec::new();
        }
    };

    let bytes = match resp.bytes().await {
        Ok(b) => b,
        Err(e) => {
            warn!(source = %source.name, error = %e, "failed to read feed body");
            return Vec::new();
        }
    };

    let feed = match feed_rs::parser::parse(&bytes[..]) {
        Ok(f) => f,
        Err(e) => {
            // `feed_url` may point at an HTML page rather than a feed
            // document; opportunistically look for a self-declared feed
            // link before giving up on this source for the cycle.
            let html = String::from_utf8_lossy(&bytes);
            match fetch_discovered_feed(client, &html, &source.feed_url).await {
                Some(feed) => {
                    info!(source = %source.name, "parsed feed via discovered link after direct parse failure");
                    feed
                }
                None => {
                    warn!(source = %source.name, error = %e, "failed to parse feed");
                    return Vec::new();
                }
            }
        }
    };

    let mut articles = Vec::new();
    for entry in feed.entries {
        let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
            continue;
        };

        if is_known(&link) {
            // RSS order is newest-first: everything past the first known
            // entry can be assumed already ingested.
            break;
        }

        articles.push(to_raw_article(source, entry, link));
        if articles.len() >= max_items {
            break;
        }
    }

    info!(source = %source.name, items = articles.len(), "fetched feed");
    articles
}

/// Find `<link rel="alternate" type="application/{rss,atom}+xml">` tags in
/// an HTML page and resolve their `href` against `base_url`. Returns feed
/// URLs in document order; the caller tries only the first.
fn discover_feed_urls(html: &str, base_url: &str) -> Vec<String> {
    let mut feeds = Vec::new();

    for cap in FEED_LINK_RE.captures_iter(html) {
        let tag = cap.get(0).map(|m| m.as_str()).unwrap_or("");
        let Some(href) = FEED_HREF_RE.captures(tag).and_then(|c| c.get(1)) else {
            continue;
        };
        let href = href.as_str();

        let resolved = if href.starts_with("http") {
            Some(href.to_string())
        } else {
            url::Url::parse(base_url)
                .ok()
                .and_then(|base| base.join(href).ok())
                .map(|u| u.to_string())
        };

        if let Some(url) = resolved {
            feeds.push(url);
        }
    }

    feeds
}

/// Try every discovered feed link in order until one fetches and parses.
async fn fetch_discovered_feed(
    client: &reqwest::Client,
    html: &str,
    base_url: &str,
) -> Option<feed_rs::model::Feed> {
    for discovered in discover_feed_urls(html, base_url) {
        let Ok(resp) = client
            .get(&discovered)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
        else {
            continue;
        };
        let Ok(bytes) = resp.bytes().await else {
            continue;
        };
        if let Ok(feed) = feed_rs::parser::parse(&bytes[..]) {
            return Some(feed);
        }
    }
    None
}

fn to_raw_article(source: &Source, entry: Entry, link: String) -> RawArticle {
    let title = entry.title.map(|t| t.content).unwrap_or_default();
    let description = entry
        .summary
        .map(|s| s.content)
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .unwrap_or_default();

    let published_at = entry
        .published
        .or(entry.updated)
        .map(|dt| dt.with_timezone(&chrono::Utc));

    let image_url = extract_image(&entry, &description);

    let author = entry.authors.first().map(|a| a.name.clone());

    RawArticle {
        source_name: source.name.clone(),
        title,
        description,
        link,
        guid: Some(entry.id),
        image_url,
        published_at,
        author,
    }
}

/// Image extraction order: media:content, then media:thumbnail, then an
/// enclosure whose type starts `image/`, then the first `<img>` in the
/// description/content HTML, then none.
fn extract_image(entry: &Entry, description: &str) -> Option<String> {
    for media in &entry.media {
        if let Some(content) = media.content.iter().find(|c| c.url.is_some()) {
            return content.url.as_ref().map(|u| u.to_string());
        }
    }

    for media in &entry.media {
        if let Some(thumb) = media.thumbnails.first() {
            return Some(thumb.image.uri.clone());
        }
    }

    for link in &entry.links {
        if link
            .media_type
            .as_deref()
            .is_some_and(|t| t.starts_with("image/"))
        {
            return Some(link.href.clone());
        }
    }

    IMG_TAG_RE
        .captures(description)
        .map(|cap| cap[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_img_tag_as_fallback() {
        let entry = Entry::default();
        let description = r#"<p>lead text</p><img src="https://cdn.example/a.jpg" alt="x">"#;
        assert_eq!(
            extract_image(&entry, description),
            Some("https://cdn.example/a.jpg".to_string())
        );
    }

    #[test]
    fn no_image_anywhere_is_none() {
        let entry = Entry::default();
        assert_eq!(extract_image(&entry, "<p>no pictures here</p>"), None);
    }

    #[test]
    fn discovers_absolute_feed_link() {
        let html = r#"<html><head><link rel="alternate" type="application/rss+xml" href="https://news.example/feed.xml"></head></html>"#;
        let feeds = discover_feed_urls(html, "https://news.example/section/world");
        assert_eq!(feeds, vec!["https://news.example/feed.xml"]);
    }

    #[test]
    fn resolves_relative_feed_link_against_base() {
        let html = r#"<link rel="alternate" type="application/atom+xml" href="/feeds/world.xml">"#;
        let feeds = discover_feed_urls(html, "https://news.example/section/world");
        assert_eq!(feeds, vec!["https://news.example/feeds/world.xml"]);
    }

    #[test]
    fn no_feed_link_yields_empty() {
        let feeds = discover_feed_urls("<html><body>no feeds here</body></html>", "https://news.example");
        assert!(feeds.is_empty());
    }
}
