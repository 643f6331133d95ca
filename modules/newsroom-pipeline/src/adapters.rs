use newsroom_cluster::{ClusterStore, UrlLookup};
use newsroom_common::Cluster;
use newsroom_store::Store;
use uuid::Uuid;

/// Thin bridge from the concrete `Store` to the storage-agnostic traits
/// `newsroom-cluster` defines. `Store`'s inherent methods already match
/// these trait signatures; this struct exists only to avoid
/// `newsroom-cluster` depending on `newsroom-store` directly.
#[derive(Clone)]
pub struct StoreAdapter {
    store: Store,
}

impl StoreAdapter {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl UrlLookup for StoreAdapter {
    async fn is_new_url(&self, normalized_url: &str) -> anyhow::Result<bool> {
        Ok(self.store.is_new_url(normalized_url).await?)
    }
}

#[async_trait::async_trait]
impl ClusterStore for StoreAdapter {
    async fn active_clusters(&self, category: &str) -> anyhow::Result<Vec<Cluster>> {
        Ok(self.store.active_clusters(category).await?)
    }

    async fn open_cluster(
        &self,
        title: &str,
        keywords: Vec<String>,
        centroid_embedding: Vec<f32>,
        category: &str,
    ) -> anyhow::Result<Uuid> {
        Ok(self
            .store
            .open_cluster(title, keywords, centroid_embedding, category)
            .await?)
    }

    async fn attach_article(
        &self,
        cluster_id: Uuid,
        new_centroid: Vec<f32>,
        new_keywords: Vec<String>,
    ) -> anyhow::Result<()> {
        Ok(self
            .store
            .attach_article(cluster_id, new_centroid, new_keywords)
            .await?)
    }
}
