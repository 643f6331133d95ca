use std::sync::Arc;

use anyhow::Result;
use newsroom_common::TextEmbedder;

/// Bridges `ai_client::OpenAi` to the `TextEmbedder` trait so the
/// clustering and embedding-cache layers never see the vendor client
/// directly.
pub struct OpenAiEmbedder {
    ai: Arc<ai_client::openai::OpenAi>,
}

impl OpenAiEmbedder {
    pub fn new(ai: Arc<ai_client::openai::OpenAi>) -> Self {
        Self { ai }
    }
}

#[async_trait::async_trait]
impl TextEmbedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.ai.create_embedding(text).await
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.ai.create_embeddings_batch(&texts).await
    }
}
