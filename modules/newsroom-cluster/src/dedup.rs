use tracing::warn;

use crate::normalize::normalize;

/// Backing lookup for the Dedup Gate. Implemented by the store crate;
/// `newsroom-cluster` only depends on the trait so it stays storage-agnostic.
#[async_trait::async_trait]
pub trait UrlLookup: Send + Sync {
    async fn is_new_url(&self, normalized_url: &str) -> anyhow::Result<bool>;
}

/// URL Normalizer & Dedup Gate (C3).
pub struct DedupGate<L: UrlLookup> {
    lookup: L,
}

impl<L: UrlLookup> DedupGate<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Normalize `raw_url` and check whether it has been seen before. A
    /// transient lookup failure is treated as "new" — the unique constraint
    /// at persistence time is the backstop against double-ingestion.
    pub async fn is_new(&self, raw_url: &str) -> (String, bool) {
        let normalized = normalize(raw_url);
        match self.lookup.is_new_url(&normalized).await {
            Ok(is_new) => (normalized, is_new),
            Err(e) => {
                warn!(url = %normalized, error = %e, "dedup lookup failed, treating as new");
                (normalized, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingLookup;

    #[async_trait::async_trait]
    impl UrlLookup for FailingLookup {
        async fn is_new_url(&self, _normalized_url: &str) -> anyhow::Result<bool> {
            anyhow::bail!("transient db error")
        }
    }

    struct StaticLookup(bool);

    #[async_trait::async_trait]
    impl UrlLookup for StaticLookup {
        async fn is_new_url(&self, _normalized_url: &str) -> anyhow::Result<bool> {
            Ok(self.0)
        }
    }

    #[tokio::test]
    async fn transient_failure_is_treated_as_new() {
        let gate = DedupGate::new(FailingLookup);
        let (_, is_new) = gate.is_new("https://example.com/a").await;
        assert!(is_new);
    }

    #[tokio::test]
    async fn known_url_is_not_new() {
        let gate = DedupGate::new(StaticLookup(false));
        let (_, is_new) = gate.is_new("https://example.com/a").await;
        assert!(!is_new);
    }
}
