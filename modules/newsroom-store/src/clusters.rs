use chrono::Utc;
use newsroom_common::{Cluster, ClusterStatus};
use sqlx::Row;
use uuid::Uuid;

use crate::error::Result;
use crate::Store;

impl Store {
    /// Candidate set for the Clustering Engine (C5 step 1). Lifecycle aging
    /// is swept separately (C12); this only filters on status so a cluster
    /// that is about to age out can still accept a same-cycle attach.
    pub async fn active_clusters(&self, category: &str) -> Result<Vec<Cluster>> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, keywords, centroid_embedding, status, source_count,
                   first_seen_at, last_updated_at, category
            FROM clusters
            WHERE status = 'active' AND category = $1
            "#,
        )
        .bind(category)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(row_to_cluster).collect())
    }

    /// Open a new cluster from the first admitted article of an event (C5
    /// "open" path).
    pub async fn open_cluster(
        &self,
        title: &str,
        keywords: Vec<String>,
        centroid_embedding: Vec<f32>,
        category: &str,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO clusters
                (id, title, keywords, centroid_embedding, status, source_count,
                 first_seen_at, last_updated_at, category)
            VALUES ($1, $2, $3, $4, 'active', 1, $5, $5, $6)
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(&keywords)
        .bind(centroid_embedding)
        .bind(now)
        .bind(category)
        .execute(self.pool())
        .await?;
        Ok(id)
    }

    /// Attach an article to an existing cluster (C5 "attach" path). The
    /// caller computes the new running-mean centroid and refreshed keyword
    /// set before calling this; the row update is a plain replace.
    pub async fn attach_article(
        &self,
        cluster_id: Uuid,
        new_centroid: Vec<f32>,
        new_keywords: Vec<String>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE clusters
            SET centroid_embedding = $1,
                keywords = $2,
                source_count = source_count + 1,
                last_updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(new_centroid)
        .bind(&new_keywords)
        .bind(Utc::now())
        .bind(cluster_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// C12 lifecycle sweep: close every active cluster that has aged out.
    /// Returns the ids closed so the caller can log/count them.
    pub async fn sweep_aged_out_clusters(
        &self,
        idle_hours: i64,
        max_hours: i64,
    ) -> Result<Vec<Uuid>> {
        let now = Utc::now();
        let candidates = sqlx::query(
            "SELECT id, first_seen_at, last_updated_at FROM clusters WHERE status = 'active'",
        )
        .fetch_all(self.pool())
        .await?;

        let mut closed = Vec::new();
        for row in candidates {
            let id: Uuid = row.get("id");
            let first_seen_at: chrono::DateTime<Utc> = row.get("first_seen_at");
            let last_updated_at: chrono::DateTime<Utc> = row.get("last_updated_at");
            let idle = now - last_updated_at > chrono::Duration::hours(idle_hours);
            let total = now - first_seen_at > chrono::Duration::hours(max_hours);
            if idle || total {
                closed.push(id);
            }
        }

        if !closed.is_empty() {
            sqlx::query("UPDATE clusters SET status = 'closed' WHERE id = ANY($1)")
                .bind(&closed)
                .execute(self.pool())
                .await?;
        }

        Ok(closed)
    }

    pub async fn get_cluster(&self, id: Uuid) -> Result<Option<Cluster>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, keywords, centroid_embedding, status, source_count,
                   first_seen_at, last_updated_at, category
            FROM clusters
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(row_to_cluster))
    }
}

fn row_to_cluster(row: sqlx::postgres::PgRow) -> Cluster {
    let status_str: String = row.get("status");
    Cluster {
        id: row.get("id"),
        title: row.get("title"),
        keywords: row.get("keywords"),
        centroid_embedding: row.get("centroid_embedding"),
        status: status_str.parse().unwrap_or(ClusterStatus::Active),
        source_count: row.get("source_count"),
        first_seen_at: row.get("first_seen_at"),
        last_updated_at: row.get("last_updated_at"),
        category: row.get("category"),
    }
}
