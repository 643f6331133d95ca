use std::sync::Arc;
use std::time::Instant;

use ai_client::claude::Claude;
use newsroom_cluster::{ClusterThresholds, ClusteringEngine, DedupGate, MatchOutcome};
use newsroom_common::{Config, EmbeddingLookup};
use newsroom_feeds::{Catalogue, FeedFetcher};
use newsroom_fulltext::FullTextFetcher;
use newsroom_store::source_articles::NewSourceArticle;
use newsroom_store::Store;
use newsroom_synthesis::{
    filter_has_image, DisplayTagger, Enricher, ImageSelector, ScoreCandidate, Scorer, Synthesizer,
};
use tracing::{error, info, warn};

use crate::adapters::StoreAdapter;
use crate::publisher::{PublishAction, Publisher};

/// Claude model used for every synthesis-tier call (C4, C8, C9, C10). Named
/// per the teacher's convention of pinning model strings to one constant
/// rather than scattering literals across call sites.
pub const SYNTHESIS_MODEL: &str = "claude-sonnet-4-5-20250929";

/// Per-cycle counters, surfaced in logs the way `ScoutStats` is, and
/// serialized into the trigger endpoint's response body.
#[derive(Debug, Default, serde::Serialize)]
pub struct CycleStats {
    pub fetched: u32,
    pub new_urls: u32,
    pub scored: u32,
    pub admitted: u32,
    pub rejected: u32,
    pub attached: u32,
    pub opened: u32,
    pub full_text_fetched: u32,
    pub full_text_failed: u32,
    pub published: u32,
    pub revised: u32,
    pub publish_skipped: u32,
    pub clusters_closed: u32,
    pub errors: u32,
}

impl std::fmt::Display for CycleStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Cycle Complete ===")?;
        writeln!(f, "Fetched:          {}", self.fetched)?;
        writeln!(f, "New URLs:         {}", self.new_urls)?;
        writeln!(f, "Scored:           {}", self.scored)?;
        writeln!(f, "Admitted:         {}", self.admitted)?;
        writeln!(f, "Rejected:         {}", self.rejected)?;
        writeln!(f, "Attached:         {}", self.attached)?;
        writeln!(f, "Opened:           {}", self.opened)?;
        writeln!(f, "Full text OK:     {}", self.full_text_fetched)?;
        writeln!(f, "Full text failed: {}", self.full_text_failed)?;
        writeln!(f, "Published:        {}", self.published)?;
        writeln!(f, "Revised:          {}", self.revised)?;
        writeln!(f, "Publish skipped:  {}", self.publish_skipped)?;
        writeln!(f, "Clusters closed:  {}", self.clusters_closed)?;
        writeln!(f, "Errors:           {}", self.errors)?;
        Ok(())
    }
}

/// Cycle Orchestrator (C13): drives C1 -> C2 -> C3 -> C4 -> C5 -> (C6, C7) ->
/// C8 -> C9 -> C10 -> C11 each cycle, wrapped by the C12 run lock and
/// lifecycle sweep. Stage failures are isolated: a failure in one cluster's
/// publish step does not abort the cycle, and an exceeded deadline cancels
/// remaining work while leaving everything already persisted valid, since
/// every stage upserts on a stable key.
pub struct Orchestrator {
    store: Store,
    catalogue: Catalogue,
    config: Config,
    feed_fetcher: FeedFetcher,
    embedding_lookup: Arc<dyn EmbeddingLookup>,
    scorer: Scorer,
    publisher: Publisher,
}

impl Orchestrator {
    pub fn new(
        store: Store,
        catalogue: Catalogue,
        config: Config,
        feed_fetcher: FeedFetcher,
        embedding_lookup: Arc<dyn EmbeddingLookup>,
    ) -> Self {
        let claude = Claude::new(config.anthropic_api_key.clone(), SYNTHESIS_MODEL);
        let scorer = Scorer::new(claude.clone(), config.score_threshold, config.admission_contract);
        let publisher = Publisher::new(
            store.clone(),
            catalogue.clone(),
            Synthesizer::new(claude.clone()),
            Enricher::new(claude.clone()),
            ImageSelector,
            DisplayTagger::new(claude),
            &config,
        );

        Self {
            store,
            catalogue,
            config,
            feed_fetcher,
            embedding_lookup,
            scorer,
            publisher,
        }
    }

    /// Run exactly one cycle, honoring the run lock. Returns `Ok(None)` when
    /// another cycle already holds the lock ("skipped" per C12), `Ok(Some)`
    /// with stats otherwise.
    pub async fn run_cycle(&self) -> anyhow::Result<Option<CycleStats>> {
        if !self.store.acquire_lock(self.config.run_lock_timeout_min).await? {
            info!("run lock held by another cycle, skipping");
            return Ok(None);
        }

        let deadline = Instant::now() + self.config.cycle_deadline();
        let result = self.run_inner(deadline).await;

        if let Err(e) = self.store.release_lock().await {
            error!(error = %e, "failed to release run lock");
        }

        result.map(Some)
    }

    async fn run_inner(&self, deadline: Instant) -> anyhow::Result<CycleStats> {
        let mut stats = CycleStats::default();

        let closed = self
            .store
            .sweep_aged_out_clusters(self.config.cluster_idle_hours, self.config.cluster_max_hours)
            .await?;
        stats.clusters_closed = closed.len() as u32;

        self.ingest(&mut stats).await;

        if Instant::now() >= deadline {
            warn!("cycle deadline exceeded before scoring stage, stopping with partial progress");
            return Ok(stats);
        }
        let fulltext_fetcher = FullTextFetcher::new(
            self.config.fetch_timeout(),
            self.config.feed_workers,
            self.config.fulltext_reader_base.clone(),
            self.config.fulltext_reader_key.clone(),
        );
        self.score_and_cluster(&mut stats, &fulltext_fetcher).await;

        if Instant::now() >= deadline {
            warn!("cycle deadline exceeded before publish stage, stopping with partial progress");
            return Ok(stats);
        }
        self.publish(&mut stats).await;

        info!("{stats}");
        Ok(stats)
    }

    /// C2 Feed Fetcher + C3 Dedup Gate: fetch every source, normalize each
    /// link, drop ones already known, persist the rest as pending.
    async fn ingest(&self, stats: &mut CycleStats) {
        let known = match self.store.known_urls().await {
            Ok(known) => known,
            Err(e) => {
                warn!(error = %e, "failed to snapshot known urls, fetching without early-stop");
                Default::default()
            }
        };

        let raw_articles = self
            .feed_fetcher
            .fetch_all(self.catalogue.list_sources(), move |link| {
                known.contains(&newsroom_cluster::normalize(link))
            })
            .await;
        stats.fetched = raw_articles.len() as u32;

        let dedup = DedupGate::new(StoreAdapter::new(self.store.clone()));
        for article in raw_articles {
            let (normalized_url, is_new) = dedup.is_new(&article.link).await;
            if !is_new {
                continue;
            }

            let category = self.catalogue.list_sources().iter().find(|s| s.name == article.source_name).map(|s| s.category.clone()).unwrap_or_else(|| "general".to_string());

            let new_article = NewSourceArticle {
                normalized_url,
                original_url: article.link,
                source_name: article.source_name,
                title: article.title,
                description: article.description,
                image_url: article.image_url,
                published_at: article.published_at,
                category,
            };

            match self.store.insert_pending(new_article).await {
                Ok(_) => stats.new_urls += 1,
                Err(e) => {
                    warn!(error = %e, "failed to persist pending article");
                    stats.errors += 1;
                }
            }
        }
    }

    /// C4 Scorer + C5 Clustering Engine, batched over every pending article.
    async fn score_and_cluster(&self, stats: &mut CycleStats, fulltext_fetcher: &FullTextFetcher) {
        let pending = match self.store.fetch_pending(10_000).await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "failed to fetch pending articles");
                stats.errors += 1;
                return;
            }
        };

        for article in pending.iter().filter(|a| a.image_url.is_none()) {
            if let Err(e) = self
                .store
                .apply_score(article.id, 0.0, "general", false)
                .await
            {
                warn!(error = %e, article_id = %article.id, "failed to persist auto-rejection");
                stats.errors += 1;
                continue;
            }
            stats.rejected += 1;
        }
        let pending = filter_has_image(&pending, |a| a.image_url.is_some());

        let adapter = StoreAdapter::new(self.store.clone());
        let thresholds = ClusterThresholds {
            t_high: self.config.cluster_t_high,
            t_mid: self.config.cluster_t_mid,
            jaccard: self.config.cluster_jaccard,
        };
        let engine = ClusteringEngine::new(thresholds);

        for batch in pending.chunks(self.config.score_batch_size) {
            let candidates: Vec<ScoreCandidate> = batch
                .iter()
                .map(|a| ScoreCandidate {
                    id: a.id.to_string(),
                    title: a.title.clone(),
                    description: a.description.clone(),
                    source_name: a.source_name.clone(),
                    credibility: self.catalogue.credibility(&a.source_name),
                })
                .collect();

            let verdicts = self.scorer.score_batch(&candidates).await;
            stats.scored += verdicts.len() as u32;

            for (article, verdict) in batch.iter().zip(verdicts.iter()) {
                if let Err(e) = self
                    .store
                    .apply_score(article.id, verdict.score, &verdict.category, verdict.admitted)
                    .await
                {
                    warn!(error = %e, article_id = %article.id, "failed to persist score");
                    stats.errors += 1;
                    continue;
                }

                if !verdict.admitted {
                    stats.rejected += 1;
                    continue;
                }
                stats.admitted += 1;

                let embedding_text = format!("{} {}", article.title, article.description);
                let embedding = match self.embedding_lookup.get(&embedding_text).await {
                    Ok(e) => Some(e),
                    Err(e) => {
                        warn!(article_id = %article.id, error = %e, "embedding lookup failed, falling back to lexical matching");
                        None
                    }
                };

                let outcome = engine
                    .process(
                        &adapter,
                        &article.title,
                        &article.description,
                        &verdict.category,
                        embedding.as_deref(),
                    )
                    .await;

                match outcome {
                    Ok(MatchOutcome::Attached { cluster_id, .. }) => {
                        stats.attached += 1;
                        self.finish_attach(article.id, cluster_id, fulltext_fetcher, stats).await;
                    }
                    Ok(MatchOutcome::Opened { cluster_id }) => {
                        stats.opened += 1;
                        self.finish_attach(article.id, cluster_id, fulltext_fetcher, stats).await;
                    }
                    Err(e) => {
                        error!(article_id = %article.id, error = %e, "clustering failed");
                        stats.errors += 1;
                    }
                }
            }
        }
    }

    /// C6 Full-Text Fetcher: best-effort, logged and skipped on failure.
    /// C5 state update: mark the article clustered.
    async fn finish_attach(
        &self,
        article_id: uuid::Uuid,
        cluster_id: uuid::Uuid,
        fulltext_fetcher: &FullTextFetcher,
        stats: &mut CycleStats,
    ) {
        if let Err(e) = self.store.attach_to_cluster(article_id, cluster_id).await {
            warn!(article_id = %article_id, error = %e, "failed to record cluster attachment");
            stats.errors += 1;
            return;
        }

        let Ok(Some(article)) = self.store.fetch_by_cluster(cluster_id).await.map(|members| {
            members.into_iter().find(|m| m.id == article_id)
        }) else {
            return;
        };

        if let Some(result) = fulltext_fetcher.fetch_once(&article.original_url).await {
            match result {
                Ok(page) => {
                    self.store
                        .update_content(article_id, &page.text, page.og_image.as_deref())
                        .await;
                    stats.full_text_fetched += 1;
                }
                Err(e) => {
                    warn!(article_id = %article_id, error = %e, "full-text fetch failed, keeping feed description");
                    stats.full_text_failed += 1;
                }
            }
        }
    }

    /// C7 Image Selector runs inside the Publisher over a cluster's member
    /// images; C8-C11 (Synthesizer, Enricher, Display Scorer/Tagger,
    /// Publisher) run per active cluster here.
    async fn publish(&self, stats: &mut CycleStats) {
        let categories: Vec<String> = self
            .catalogue
            .list_sources()
            .iter()
            .map(|s| s.category.clone())
            .collect::<std::collections::HashSet<_>>()
            .into_iter()
            .collect();

        for category in categories {
            let clusters = match self.store.active_clusters(&category).await {
                Ok(c) => c,
                Err(e) => {
                    error!(category, error = %e, "failed to list active clusters");
                    stats.errors += 1;
                    continue;
                }
            };

            for cluster in clusters {
                let members = match self.store.fetch_by_cluster(cluster.id).await {
                    Ok(m) => m,
                    Err(e) => {
                        error!(cluster_id = %cluster.id, error = %e, "failed to fetch cluster members");
                        stats.errors += 1;
                        continue;
                    }
                };
                if members.len() as i64 != cluster.source_count {
                    warn!(
                        cluster_id = %cluster.id,
                        source_count = cluster.source_count,
                        actual_members = members.len(),
                        "cluster source_count invariant violated"
                    );
                }

                let top_score = members.iter().filter_map(|m| m.score).fold(0.0_f64, f64::max);

                match self.publisher.publish_or_revise(&cluster, top_score).await {
                    Ok(PublishAction::Published) => stats.published += 1,
                    Ok(PublishAction::Revised) => stats.revised += 1,
                    Ok(PublishAction::Skipped) => stats.publish_skipped += 1,
                    Err(e) => {
                        error!(cluster_id = %cluster.id, error = %e, "publish failed for cluster");
                        stats.errors += 1;
                    }
                }
            }
        }
    }
}
