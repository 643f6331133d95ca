use chrono::Utc;
use newsroom_common::{Cluster, ClusterStatus, Config, PublishedArticle};
use newsroom_feeds::Catalogue;
use newsroom_store::published_articles::PublishedArticleDraft;
use newsroom_store::Store;
use newsroom_synthesis::{
    DisplayTagger, Enricher, ImageCandidate, ImageSelector, ReferenceAnchor, SourceText, Synthesizer,
};
use tracing::{info, warn};

/// Number of recently (re)published titles given to the Scorer-for-Display
/// as calibration anchors.
const CALIBRATION_ANCHOR_COUNT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishAction {
    Published,
    Revised,
    Skipped,
}

impl std::fmt::Display for PublishAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishAction::Published => write!(f, "published"),
            PublishAction::Revised => write!(f, "revised"),
            PublishAction::Skipped => write!(f, "skipped"),
        }
    }
}

/// Publisher (C11): decides whether a cluster should be published for the
/// first time, revised in place, or left untouched this cycle, then drives
/// synthesis (C8), enrichment (C9) and display scoring/tagging (C10) to
/// produce the row it upserts.
pub struct Publisher {
    store: Store,
    catalogue: Catalogue,
    synthesizer: Synthesizer,
    enricher: Enricher,
    image_selector: ImageSelector,
    display_tagger: DisplayTagger,
    update_high_score: f64,
    update_source_delta: i64,
    update_cooldown_min: i64,
}

impl Publisher {
    pub fn new(
        store: Store,
        catalogue: Catalogue,
        synthesizer: Synthesizer,
        enricher: Enricher,
        image_selector: ImageSelector,
        display_tagger: DisplayTagger,
        config: &Config,
    ) -> Self {
        Self {
            store,
            catalogue,
            synthesizer,
            enricher,
            image_selector,
            display_tagger,
            update_high_score: config.update_high_score,
            update_source_delta: config.update_source_delta,
            update_cooldown_min: config.update_cooldown_min,
        }
    }

    /// Decide whether `cluster` should be (re)published, and do it. `top_score`
    /// is the highest admission score among the cluster's member articles,
    /// used for the high-score revision trigger.
    pub async fn publish_or_revise(
        &self,
        cluster: &Cluster,
        top_score: f64,
    ) -> anyhow::Result<PublishAction> {
        let existing = self.store.get_published_by_cluster(cluster.id).await?;

        if let Some(existing) = &existing {
            if cluster.status == ClusterStatus::Closed {
                return Ok(PublishAction::Skipped);
            }
            if !self.should_revise(cluster, existing, top_score) {
                return Ok(PublishAction::Skipped);
            }
        }

        let members = self.store.fetch_by_cluster(cluster.id).await?;
        if members.is_empty() {
            warn!(cluster_id = %cluster.id, "cluster has no members, skipping publish");
            return Ok(PublishAction::Skipped);
        }

        let sources: Vec<SourceText> = members
            .iter()
            .map(|m| SourceText {
                source_name: m.source_name.clone(),
                credibility: self.catalogue.credibility(&m.source_name),
                published_at: m.published_at,
                text: m.content.clone().unwrap_or_else(|| m.description.clone()),
            })
            .collect();

        let Some(synthesis) = self.synthesizer.synthesize(&cluster.title, &sources).await? else {
            warn!(cluster_id = %cluster.id, "synthesis rejected, skipping publish this cycle");
            return Ok(PublishAction::Skipped);
        };

        let enrichment = self
            .enricher
            .enrich(&synthesis.title, &synthesis.summary_bullets, &synthesis.content_standard)
            .await?;

        let image_candidates: Vec<ImageCandidate> = members
            .iter()
            .filter_map(|m| {
                m.image_url.clone().map(|url| ImageCandidate {
                    url,
                    source_name: m.source_name.clone(),
                    credibility: self.catalogue.credibility(&m.source_name),
                    width: None,
                    height: None,
                    normalized_article_score: m.score.unwrap_or(0.0) / 1000.0,
                })
            })
            .collect();
        let image = self.image_selector.select(&image_candidates);

        let anchors = self.fetch_anchors().await;
        let display_score = self
            .display_tagger
            .score_display(&synthesis.title, &synthesis.summary_bullets, &anchors)
            .await;
        let tags = self
            .display_tagger
            .tag(&synthesis.title, &synthesis.content_standard, &synthesis.category)
            .await;

        let draft = PublishedArticleDraft {
            cluster_id: cluster.id,
            title: synthesis.title,
            summary_bullets: synthesis.summary_bullets,
            content_standard: synthesis.content_standard,
            content_b2: synthesis.content_b2,
            image_url: image.map(|i| i.url),
            timeline: enrichment.timeline,
            details: enrichment.details,
            graph: enrichment.graph,
            map: enrichment.map,
            countries: tags.countries,
            topics: tags.topics,
            display_score,
            source_count_at_publish: cluster.source_count,
        };

        let action = if existing.is_some() {
            PublishAction::Revised
        } else {
            PublishAction::Published
        };

        let id = self.store.upsert_published(draft).await?;
        info!(cluster_id = %cluster.id, published_id = %id, %action, "publisher finished");
        Ok(action)
    }

    fn should_revise(&self, cluster: &Cluster, existing: &PublishedArticle, top_score: f64) -> bool {
        revision_due(
            cluster.source_count,
            existing.source_count_at_publish,
            existing.last_revised_at,
            top_score,
            self.update_high_score,
            self.update_source_delta,
            self.update_cooldown_min,
        )
    }

    async fn fetch_anchors(&self) -> Vec<ReferenceAnchor> {
        match self.store.recent_display_anchors(CALIBRATION_ANCHOR_COUNT).await {
            Ok(rows) => rows
                .into_iter()
                .map(|(title, display_score)| ReferenceAnchor { title, display_score })
                .collect(),
            Err(e) => {
                warn!(error = %e, "failed to fetch display-score calibration anchors, scoring without them");
                Vec::new()
            }
        }
    }
}

/// The two C11 revision triggers (high score, source-count delta), both
/// gated by the cooldown. Free function so it's testable without a live
/// `Store`.
#[allow(clippy::too_many_arguments)]
fn revision_due(
    cluster_source_count: i64,
    published_source_count: i64,
    last_revised_at: chrono::DateTime<Utc>,
    top_score: f64,
    update_high_score: f64,
    update_source_delta: i64,
    update_cooldown_min: i64,
) -> bool {
    let cooldown_elapsed =
        Utc::now() - last_revised_at > chrono::Duration::minutes(update_cooldown_min);
    if !cooldown_elapsed {
        return false;
    }

    let high_score_trigger = top_score >= update_high_score;
    let source_delta_trigger = cluster_source_count - published_source_count >= update_source_delta;

    high_score_trigger || source_delta_trigger
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes_ago(n: i64) -> chrono::DateTime<Utc> {
        Utc::now() - chrono::Duration::minutes(n)
    }

    #[test]
    fn within_cooldown_never_revises() {
        assert!(!revision_due(10, 1, minutes_ago(5), 999.0, 850.0, 4, 30));
    }

    #[test]
    fn high_score_triggers_after_cooldown() {
        assert!(revision_due(3, 3, minutes_ago(31), 900.0, 850.0, 4, 30));
    }

    #[test]
    fn source_delta_triggers_after_cooldown() {
        assert!(revision_due(8, 3, minutes_ago(31), 0.0, 850.0, 4, 30));
    }

    #[test]
    fn neither_trigger_skips() {
        assert!(!revision_due(4, 3, minutes_ago(31), 500.0, 850.0, 4, 30));
    }
}
