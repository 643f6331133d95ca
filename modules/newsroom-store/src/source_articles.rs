use chrono::{DateTime, Utc};
use newsroom_common::{SourceArticle, SourceArticleStatus};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::Store;

/// Fields needed to insert a freshly-normalized, not-yet-scored article.
pub struct NewSourceArticle {
    pub normalized_url: String,
    pub original_url: String,
    pub source_name: String,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub category: String,
}

impl Store {
    /// Dedup Gate lookup (C3). On transient lookup failure the caller should
    /// treat the article as new and rely on the unique constraint at insert
    /// time; this method surfaces that failure rather than swallowing it so
    /// the caller can apply that policy.
    pub async fn is_new_url(&self, normalized_url: &str) -> Result<bool> {
        let row: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM source_articles WHERE normalized_url = $1")
                .bind(normalized_url)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.is_none())
    }

    /// Snapshot of every known `normalized_url`, used by the Feed Fetcher
    /// (C2) to stop paginating a source once it reaches an already-ingested
    /// entry. A transient failure here just disables that optimization for
    /// the cycle; the unique constraint at insert time is the backstop.
    pub async fn known_urls(&self) -> Result<std::collections::HashSet<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT normalized_url FROM source_articles")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(|(u,)| u).collect())
    }

    /// Insert a pending article. Idempotent: a conflicting `normalized_url`
    /// is treated as success (error kind 5, persistence conflict) and the
    /// existing row's id is returned instead of erroring.
    pub async fn insert_pending(&self, article: NewSourceArticle) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO source_articles
                (id, normalized_url, original_url, source_name, title, description,
                 image_url, published_at, category, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
            ON CONFLICT (normalized_url) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&article.normalized_url)
        .bind(&article.original_url)
        .bind(&article.source_name)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.image_url)
        .bind(article.published_at)
        .bind(&article.category)
        .fetch_optional(self.pool())
        .await?;

        match inserted {
            Some((id,)) => Ok(id),
            None => {
                let existing: (Uuid,) =
                    sqlx::query_as("SELECT id FROM source_articles WHERE normalized_url = $1")
                        .bind(&article.normalized_url)
                        .fetch_one(self.pool())
                        .await?;
                Ok(existing.0)
            }
        }
    }

    /// All rows with `status = 'pending'`, for the Scorer (C4) to batch.
    pub async fn fetch_pending(&self, limit: i64) -> Result<Vec<SourceArticle>> {
        let rows = sqlx::query(
            r#"
            SELECT id, normalized_url, original_url, source_name, title, description,
                   content, image_url, published_at, fetched_at, score, category,
                   cluster_id, status
            FROM source_articles
            WHERE status = 'pending'
            ORDER BY fetched_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_source_article).collect())
    }

    /// Apply a Scorer verdict (C4): either reject, or carry the score
    /// forward for the Clustering Engine to pick up.
    pub async fn apply_score(
        &self,
        id: Uuid,
        score: f64,
        category: &str,
        admitted: bool,
    ) -> Result<()> {
        let status = if admitted {
            SourceArticleStatus::Pending
        } else {
            SourceArticleStatus::Rejected
        };
        sqlx::query(
            "UPDATE source_articles SET score = $1, category = $2, status = $3 WHERE id = $4",
        )
        .bind(score)
        .bind(category)
        .bind(status.to_string())
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Attach an admitted article to a cluster (C5 state update on attach or
    /// open). Once `status = clustered`, `cluster_id` is immutable for this
    /// row per the data model invariant.
    pub async fn attach_to_cluster(&self, id: Uuid, cluster_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE source_articles SET cluster_id = $1, status = 'clustered' WHERE id = $2",
        )
        .bind(cluster_id)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// All clustered members of a cluster, for full-text fetch, image
    /// selection and synthesis.
    pub async fn fetch_by_cluster(&self, cluster_id: Uuid) -> Result<Vec<SourceArticle>> {
        let rows = sqlx::query(
            r#"
            SELECT id, normalized_url, original_url, source_name, title, description,
                   content, image_url, published_at, fetched_at, score, category,
                   cluster_id, status
            FROM source_articles
            WHERE cluster_id = $1
            ORDER BY fetched_at ASC
            "#,
        )
        .bind(cluster_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_source_article).collect())
    }

    /// Record full text retrieved by the Full-Text Fetcher (C6). Logs and
    /// continues on failure rather than aborting the cycle.
    pub async fn update_content(&self, id: Uuid, content: &str, image_url: Option<&str>) {
        let result = sqlx::query(
            "UPDATE source_articles SET content = $1, image_url = COALESCE($2, image_url) WHERE id = $3",
        )
        .bind(content)
        .bind(image_url)
        .bind(id)
        .execute(self.pool())
        .await;

        if let Err(e) = result {
            warn!(article_id = %id, error = %e, "failed to persist full text");
        }
    }
}

fn row_to_source_article(row: sqlx::postgres::PgRow) -> SourceArticle {
    let status_str: String = row.get("status");
    SourceArticle {
        id: row.get("id"),
        normalized_url: row.get("normalized_url"),
        original_url: row.get("original_url"),
        source_name: row.get("source_name"),
        title: row.get("title"),
        description: row.get("description"),
        content: row.get("content"),
        image_url: row.get("image_url"),
        published_at: row.get("published_at"),
        fetched_at: row.get("fetched_at"),
        score: row.get("score"),
        category: row.get("category"),
        cluster_id: row.get("cluster_id"),
        status: status_str.parse().unwrap_or(SourceArticleStatus::Pending),
    }
}
