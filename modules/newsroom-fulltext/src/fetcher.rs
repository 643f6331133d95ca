use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tracing::{info, warn};

use crate::extract::{extract, MIN_ARTICLE_CHARS};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const MAX_TEXT_CHARS: usize = 15_000;
const TRUNCATION_MARKER: &str = "\n\n[... truncated]";

#[derive(Debug, Clone)]
pub struct FullTextResult {
    pub title: Option<String>,
    pub text: String,
    pub og_image: Option<String>,
}

/// Full-Text Fetcher (C6). Two-tier strategy: a direct HTTPS fetch with a
/// browser user agent and HTML extraction, falling back to a reader-API
/// service when the direct fetch fails or yields too little text.
pub struct FullTextFetcher {
    client: reqwest::Client,
    reader_api_base: Option<String>,
    reader_api_key: Option<String>,
    semaphore: Arc<Semaphore>,
    fetched: Arc<Mutex<HashSet<String>>>,
}

impl FullTextFetcher {
    pub fn new(
        timeout: Duration,
        workers: usize,
        reader_api_base: Option<String>,
        reader_api_key: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build full-text HTTP client");
        Self {
            client,
            reader_api_base,
            reader_api_key,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            fetched: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Fetch the full text of one URL, at most once for the lifetime of this
    /// fetcher instance (cycle-scoped: a new orchestrator cycle constructs a
    /// new fetcher). Subsequent calls for an already-fetched URL are no-ops
    /// that return `None`, since the caller already has the result.
    pub async fn fetch_once(&self, url: &str) -> Option<anyhow::Result<FullTextResult>> {
        {
            let mut seen = self.fetched.lock().await;
            if !seen.insert(url.to_string()) {
                return None;
            }
        }
        Some(self.fetch(url).await)
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<FullTextResult> {
        let _permit = self.semaphore.acquire().await?;

        match self.fetch_direct(url).await {
            Ok(result) if result.text.len() >= MIN_ARTICLE_CHARS => {
                info!(url, chars = result.text.len(), tier = "direct", "fetched full text");
                Ok(truncate(result))
            }
            Ok(_) | Err(_) => {
                warn!(url, "direct fetch insufficient, falling back to reader API");
                let result = self.fetch_via_reader(url).await?;
                Ok(truncate(result))
            }
        }
    }

    async fn fetch_direct(&self, url: &str) -> anyhow::Result<FullTextResult> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?
            .error_for_status()?;

        let html = resp.text().await?;
        let extracted = extract(&html);

        Ok(FullTextResult {
            title: extracted.title,
            text: extracted.text,
            og_image: extracted.og_image,
        })
    }

    async fn fetch_via_reader(&self, url: &str) -> anyhow::Result<FullTextResult> {
        let base = self
            .reader_api_base
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no reader API configured, cannot fall back"))?;

        let mut request = self.client.get(format!("{base}/{url}"));
        if let Some(key) = &self.reader_api_key {
            request = request.bearer_auth(key);
        }

        let text = request.send().await?.error_for_status()?.text().await?;

        Ok(FullTextResult {
            title: None,
            text,
            og_image: None,
        })
    }
}

fn truncate(mut result: FullTextResult) -> FullTextResult {
    if result.text.len() > MAX_TEXT_CHARS {
        let mut boundary = MAX_TEXT_CHARS;
        while !result.text.is_char_boundary(boundary) {
            boundary -= 1;
        }
        result.text.truncate(boundary);
        result.text.push_str(TRUNCATION_MARKER);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_long_text_with_marker() {
        let result = FullTextResult {
            title: None,
            text: "a".repeat(MAX_TEXT_CHARS + 500),
            og_image: None,
        };
        let truncated = truncate(result);
        assert!(truncated.text.ends_with(TRUNCATION_MARKER));
        assert!(truncated.text.len() <= MAX_TEXT_CHARS + TRUNCATION_MARKER.len());
    }

    #[test]
    fn short_text_is_unchanged() {
        let result = FullTextResult {
            title: None,
            text: "short article".to_string(),
            og_image: None,
        };
        let truncated = truncate(result);
        assert_eq!(truncated.text, "short article");
    }
}
