use std::sync::Arc;

use anyhow::Result;
use newsroom_common::{EmbeddingLookup, TextEmbedder};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use sqlx::Row;
use tracing::debug;

/// Get-or-compute cache over a `TextEmbedder`, keyed by
/// `sha256(model_version || text)`. Shared by the Clustering Engine (C5) and
/// Article Scorer (C4) so neither pays for the same embedding twice.
#[derive(Clone)]
pub struct EmbeddingStore {
    pool: PgPool,
    embedder: Arc<dyn TextEmbedder>,
    model_version: String,
}

impl EmbeddingStore {
    pub fn new(pool: PgPool, embedder: Arc<dyn TextEmbedder>, model_version: String) -> Self {
        Self {
            pool,
            embedder,
            model_version,
        }
    }

    fn hash_key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.model_version.as_bytes());
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Pre-warm the cache for a batch of texts, issuing a single
    /// `embed_batch` call for whatever is missing. Returns the number of
    /// embeddings actually computed.
    pub async fn warm(&self, texts: &[&str]) -> Result<usize> {
        let mut misses = Vec::new();
        let mut miss_keys = Vec::new();

        for &text in texts {
            let key = self.hash_key(text);
            let cached: Option<(String,)> =
                sqlx::query_as("SELECT input_hash FROM embedding_cache WHERE input_hash = $1")
                    .bind(&key)
                    .fetch_optional(&self.pool)
                    .await?;
            if cached.is_none() {
                misses.push(text.to_string());
                miss_keys.push(key);
            }
        }

        if misses.is_empty() {
            return Ok(0);
        }

        debug!(count = misses.len(), "warming embedding cache");
        let computed = misses.len();
        let embeddings = self.embedder.embed_batch(misses).await?;

        for (key, embedding) in miss_keys.into_iter().zip(embeddings.into_iter()) {
            sqlx::query(
                r#"
                INSERT INTO embedding_cache (input_hash, model_version, embedding)
                VALUES ($1, $2, $3)
                ON CONFLICT (input_hash) DO NOTHING
                "#,
            )
            .bind(&key)
            .bind(&self.model_version)
            .bind(&embedding)
            .execute(&self.pool)
            .await?;
        }

        Ok(computed)
    }
}

#[async_trait::async_trait]
impl EmbeddingLookup for EmbeddingStore {
    async fn get(&self, text: &str) -> Result<Vec<f32>> {
        let key = self.hash_key(text);

        let cached = sqlx::query("SELECT embedding FROM embedding_cache WHERE input_hash = $1")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = cached {
            let embedding: Vec<f32> = row.get("embedding");
            return Ok(embedding);
        }

        let embedding = self.embedder.embed(text).await?;

        sqlx::query(
            r#"
            INSERT INTO embedding_cache (input_hash, model_version, embedding)
            VALUES ($1, $2, $3)
            ON CONFLICT (input_hash) DO NOTHING
            "#,
        )
        .bind(&key)
        .bind(&self.model_version)
        .bind(&embedding)
        .execute(&self.pool)
        .await?;

        Ok(embedding)
    }
}
