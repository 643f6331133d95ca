use newsroom_common::text::{cosine_similarity, extract_keywords, jaccard, significant_tokens};
use newsroom_common::Cluster;
use tracing::info;
use uuid::Uuid;

/// Backing store for cluster candidates and mutations. Implemented by the
/// store crate; `newsroom-cluster` only depends on this trait.
#[async_trait::async_trait]
pub trait ClusterStore: Send + Sync {
    async fn active_clusters(&self, category: &str) -> anyhow::Result<Vec<Cluster>>;
    async fn open_cluster(
        &self,
        title: &str,
        keywords: Vec<String>,
        centroid_embedding: Vec<f32>,
        category: &str,
    ) -> anyhow::Result<Uuid>;
    async fn attach_article(
        &self,
        cluster_id: Uuid,
        new_centroid: Vec<f32>,
        new_keywords: Vec<String>,
    ) -> anyhow::Result<()>;
}

/// Jaccard floor used for the lexical-only fallback when an embedding could
/// not be computed for an article.
const LEXICAL_FALLBACK_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy)]
pub struct ClusterThresholds {
    pub t_high: f64,
    pub t_mid: f64,
    pub jaccard: f64,
}

#[derive(Debug, Clone)]
pub enum MatchOutcome {
    Attached { cluster_id: Uuid, similarity: f64 },
    Opened { cluster_id: Uuid },
}

/// Clustering Engine (C5): decides, for each scored article, whether it
/// continues an existing cluster or begins a new one.
pub struct ClusteringEngine {
    thresholds: ClusterThresholds,
}

impl ClusteringEngine {
    pub fn new(thresholds: ClusterThresholds) -> Self {
        Self { thresholds }
    }

    /// `embedding` is `None` when the embedding vendor failed for this
    /// article; the engine then falls back to lexical-only matching for
    /// this article alone rather than halting the cycle.
    pub async fn process(
        &self,
        store: &dyn ClusterStore,
        title: &str,
        description: &str,
        category: &str,
        embedding: Option<&[f32]>,
    ) -> anyhow::Result<MatchOutcome> {
        let candidates = store.active_clusters(category).await?;

        if candidates.is_empty() {
            return self.open(store, title, description, category, embedding).await;
        }

        let article_tokens = significant_tokens(title);

        let mut best: Option<(&Cluster, f64)> = None;
        for cluster in &candidates {
            let sim = match embedding {
                Some(e) if !cluster.centroid_embedding.is_empty() => cosine_similarity(e, cluster.centroid_embedding.as_slice()),
                _ => {
                    let cluster_tokens = significant_tokens(
                        &format!("{} {}", cluster.title, cluster.keywords.join(" ")),
                    );
                    jaccard(&article_tokens, &cluster_tokens)
                }
            };
            if best.map_or(true, |(_, best_sim)| sim > best_sim) {
                best = Some((cluster, sim));
            }
        }

        let Some((cluster, similarity)) = best else {
            return self.open(store, title, description, category, embedding).await;
        };

        let using_embedding = embedding.is_some() && !cluster.centroid_embedding.is_empty();
        let high = if using_embedding {
            self.thresholds.t_high
        } else {
            LEXICAL_FALLBACK_THRESHOLD
        };
        let mid = if using_embedding {
            self.thresholds.t_mid
        } else {
            LEXICAL_FALLBACK_THRESHOLD
        };

        if similarity >= high {
            return self.attach(store, cluster, title, embedding, similarity).await;
        }

        if using_embedding && similarity >= mid {
            let cluster_tokens =
                significant_tokens(&format!("{} {}", cluster.title, cluster.keywords.join(" ")));
            let lexical = jaccard(&article_tokens, &cluster_tokens);
            if lexical >= self.thresholds.jaccard {
                return self.attach(store, cluster, title, embedding, similarity).await;
            }
        }

        self.open(store, title, description, category, embedding).await
    }

    async fn attach(
        &self,
        store: &dyn ClusterStore,
        cluster: &Cluster,
        title: &str,
        embedding: Option<&[f32]>,
        similarity: f64,
    ) -> anyhow::Result<MatchOutcome> {
        let new_centroid = match embedding {
            Some(e) if !cluster.centroid_embedding.is_empty() => {
                running_mean(&cluster.centroid_embedding, e, cluster.source_count)
            }
            _ => cluster.centroid_embedding.clone(),
        };

        let mut keywords = cluster.keywords.clone();
        for kw in extract_keywords(&[title], 5) {
            if !keywords.contains(&kw) {
                keywords.push(kw);
            }
        }
        keywords.truncate(10);

        store
            .attach_article(cluster.id, new_centroid, keywords)
            .await?;

        info!(cluster_id = %cluster.id, similarity, "attached article to cluster");
        Ok(MatchOutcome::Attached {
            cluster_id: cluster.id,
            similarity,
        })
    }

    async fn open(
        &self,
        store: &dyn ClusterStore,
        title: &str,
        description: &str,
        category: &str,
        embedding: Option<&[f32]>,
    ) -> anyhow::Result<MatchOutcome> {
        let keywords = extract_keywords(&[title, description], 5);
        let centroid = embedding.map(|e| e.to_vec()).unwrap_or_default();
        let cluster_id = store
            .open_cluster(title, keywords, centroid, category)
            .await?;
        info!(cluster_id = %cluster_id, "opened new cluster");
        Ok(MatchOutcome::Opened { cluster_id })
    }
}

/// Running-mean centroid update: c' = (n*c + e(a)) / (n+1).
fn running_mean(current: &[f32], incoming: &[f32], n: i64) -> Vec<f32> {
    if current.is_empty() {
        return incoming.to_vec();
    }
    let n = n.max(0) as f32;
    current
        .iter()
        .zip(incoming.iter())
        .map(|(c, e)| (n * c + e) / (n + 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_mean_averages_toward_new_point() {
        let current = vec![1.0, 1.0];
        let incoming = vec![3.0, 3.0];
        let updated = running_mean(&current, &incoming, 1);
        assert_eq!(updated, vec![2.0, 2.0]);
    }

    #[test]
    fn running_mean_on_empty_centroid_is_incoming() {
        let updated = running_mean(&[], &[5.0, 6.0], 0);
        assert_eq!(updated, vec![5.0, 6.0]);
    }
}
