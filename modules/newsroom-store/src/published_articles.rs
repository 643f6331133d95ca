use chrono::Utc;
use newsroom_common::{DetailEntry, GraphComponent, MapAnchor, PublishedArticle, TimelineEvent};
use sqlx::Row;
use uuid::Uuid;

use crate::error::Result;
use crate::Store;

/// Fields produced by synthesis + enrichment + tagging for one cluster (C11
/// Publisher input).
pub struct PublishedArticleDraft {
    pub cluster_id: Uuid,
    pub title: String,
    pub summary_bullets: Vec<String>,
    pub content_standard: String,
    pub content_b2: String,
    pub image_url: Option<String>,
    pub timeline: Option<Vec<TimelineEvent>>,
    pub details: Option<Vec<DetailEntry>>,
    pub graph: Option<GraphComponent>,
    pub map: Option<MapAnchor>,
    pub countries: Vec<String>,
    pub topics: Vec<String>,
    pub display_score: f64,
    pub source_count_at_publish: i64,
}

impl Store {
    pub async fn get_published_by_cluster(
        &self,
        cluster_id: Uuid,
    ) -> Result<Option<PublishedArticle>> {
        let row = sqlx::query(
            r#"
            SELECT id, cluster_id, title, summary_bullets, content_standard, content_b2,
                   image_url, timeline, details, graph, map, countries, topics,
                   display_score, source_count_at_publish, published_at, last_revised_at
            FROM published_articles
            WHERE cluster_id = $1
            "#,
        )
        .bind(cluster_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(row_to_published_article).transpose()?)
    }

    /// Recently (re)published titles + display scores, used as calibration
    /// anchors by the Scorer-for-Display (C10).
    pub async fn recent_display_anchors(&self, limit: i64) -> Result<Vec<(String, f64)>> {
        let rows = sqlx::query(
            "SELECT title, display_score FROM published_articles \
             ORDER BY last_revised_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("title"), row.get("display_score")))
            .collect())
    }

    /// C11 Publisher: insert a new published article, or revise the existing
    /// one in place (no new row, `last_revised_at` advances).
    pub async fn upsert_published(&self, draft: PublishedArticleDraft) -> Result<Uuid> {
        let existing = self.get_published_by_cluster(draft.cluster_id).await?;
        let now = Utc::now();

        let timeline = draft.timeline.as_ref().map(serde_json::to_value).transpose()?;
        let details = draft.details.as_ref().map(serde_json::to_value).transpose()?;
        let graph = draft.graph.as_ref().map(serde_json::to_value).transpose()?;
        let map = draft.map.as_ref().map(serde_json::to_value).transpose()?;

        if let Some(existing) = existing {
            sqlx::query(
                r#"
                UPDATE published_articles
                SET title = $1, summary_bullets = $2, content_standard = $3, content_b2 = $4,
                    image_url = $5, timeline = $6, details = $7, graph = $8, map = $9,
                    countries = $10, topics = $11, display_score = $12,
                    source_count_at_publish = $13, last_revised_at = $14
                WHERE id = $15
                "#,
            )
            .bind(&draft.title)
            .bind(&draft.summary_bullets)
            .bind(&draft.content_standard)
            .bind(&draft.content_b2)
            .bind(&draft.image_url)
            .bind(timeline)
            .bind(details)
            .bind(graph)
            .bind(map)
            .bind(&draft.countries)
            .bind(&draft.topics)
            .bind(draft.display_score)
            .bind(draft.source_count_at_publish)
            .bind(now)
            .bind(existing.id)
            .execute(self.pool())
            .await?;
            Ok(existing.id)
        } else {
            let id = Uuid::new_v4();
            sqlx::query(
                r#"
                INSERT INTO published_articles
                    (id, cluster_id, title, summary_bullets, content_standard, content_b2,
                     image_url, timeline, details, graph, map, countries, topics,
                     display_score, source_count_at_publish, published_at, last_revised_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
                "#,
            )
            .bind(id)
            .bind(draft.cluster_id)
            .bind(&draft.title)
            .bind(&draft.summary_bullets)
            .bind(&draft.content_standard)
            .bind(&draft.content_b2)
            .bind(&draft.image_url)
            .bind(timeline)
            .bind(details)
            .bind(graph)
            .bind(map)
            .bind(&draft.countries)
            .bind(&draft.topics)
            .bind(draft.display_score)
            .bind(draft.source_count_at_publish)
            .bind(now)
            .execute(self.pool())
            .await?;
            Ok(id)
        }
    }
}

fn row_to_published_article(row: sqlx::postgres::PgRow) -> Result<PublishedArticle> {
    let timeline: Option<serde_json::Value> = row.get("timeline");
    let details: Option<serde_json::Value> = row.get("details");
    let graph: Option<serde_json::Value> = row.get("graph");
    let map: Option<serde_json::Value> = row.get("map");

    Ok(PublishedArticle {
        id: row.get("id"),
        cluster_id: row.get("cluster_id"),
        title: row.get("title"),
        summary_bullets: row.get("summary_bullets"),
        content_standard: row.get("content_standard"),
        content_b2: row.get("content_b2"),
        image_url: row.get("image_url"),
        timeline: timeline.map(serde_json::from_value).transpose()?,
        details: details.map(serde_json::from_value).transpose()?,
        graph: graph.map(serde_json::from_value).transpose()?,
        map: map.map(serde_json::from_value).transpose()?,
        countries: row.get("countries"),
        topics: row.get("topics"),
        display_score: row.get("display_score"),
        source_count_at_publish: row.get("source_count_at_publish"),
        published_at: row.get("published_at"),
        last_revised_at: row.get("last_revised_at"),
    })
}
