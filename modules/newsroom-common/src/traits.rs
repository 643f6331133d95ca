use anyhow::Result;

/// Computes embedding vectors for text. Implemented by the embedding vendor
/// client; the clustering engine and the embedding cache only ever see this
/// trait, never the vendor's own types.
#[async_trait::async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Get-or-compute lookup over a cache of embeddings keyed by input text.
#[async_trait::async_trait]
pub trait EmbeddingLookup: Send + Sync {
    async fn get(&self, text: &str) -> Result<Vec<f32>>;
}
