use ai_client::claude::Claude;
use newsroom_common::config::AdmissionContract;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::retry::llm_call;

/// One candidate sent to the batch scorer.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub source_name: String,
    pub credibility: u8,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ScoreResponse {
    pub verdicts: Vec<ScoreVerdict>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ScoreVerdict {
    /// Echoes the candidate's `id`.
    pub id: String,
    pub score: f64,
    /// A coarse topical label, e.g. "politics", "technology".
    pub category: String,
}

pub struct ScoredArticle {
    pub id: String,
    pub score: f64,
    pub category: String,
    pub admitted: bool,
}

/// Article Scorer (C4). Applies whichever admission contract the deployment
/// is configured for; the threshold comparison is the caller's only job
/// once a numeric score comes back.
pub struct Scorer {
    claude: Claude,
    threshold: f64,
    system_prompt: String,
}

impl Scorer {
    pub fn new(claude: Claude, threshold: f64, contract: AdmissionContract) -> Self {
        let system_prompt = format!(
            "You are a news editor scoring candidate articles for global relevance, \
             surprise, accessibility, and scientific interest. Score each article from \
             0 to {} ({} scale). Respond only with structured JSON matching the schema. \
             Be consistent and decisive.",
            contract.max_score() as u64,
            if contract == AdmissionContract::A { "0-100" } else { "0-1000" },
        );
        Self {
            claude,
            threshold,
            system_prompt,
        }
    }

    /// Score one batch (already capped to the configured batch size by the
    /// caller). On persistent failure every candidate in the batch is
    /// assigned a neutral score and rejected, so a vendor outage cannot
    /// corrupt downstream stages with invented data.
    pub async fn score_batch(&self, candidates: &[ScoreCandidate]) -> Vec<ScoredArticle> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let prompt = build_prompt(candidates);
        let result: anyhow::Result<ScoreResponse> = llm_call("scorer.score_batch", || {
            self.claude.extract_with_temperature(&self.system_prompt, &prompt, 0.0)
        })
        .await;

        match result {
            Ok(response) => self.apply_threshold(candidates, response.verdicts),
            Err(e) => {
                warn!(error = %e, batch_size = candidates.len(), "scorer batch failed persistently, rejecting batch with neutral score");
                candidates
                    .iter()
                    .map(|c| ScoredArticle {
                        id: c.id.clone(),
                        score: 0.0,
                        category: "general".to_string(),
                        admitted: false,
                    })
                    .collect()
            }
        }
    }

    fn apply_threshold(
        &self,
        candidates: &[ScoreCandidate],
        verdicts: Vec<ScoreVerdict>,
    ) -> Vec<ScoredArticle> {
        let mut by_id: std::collections::HashMap<String, ScoreVerdict> =
            verdicts.into_iter().map(|v| (v.id.clone(), v)).collect();

        candidates
            .iter()
            .map(|c| match by_id.remove(&c.id) {
                Some(v) => {
                    let admitted = v.score >= self.threshold;
                    ScoredArticle {
                        id: c.id.clone(),
                        score: v.score,
                        category: v.category,
                        admitted,
                    }
                }
                None => {
                    warn!(id = %c.id, "scorer response missing verdict for candidate, rejecting");
                    ScoredArticle {
                        id: c.id.clone(),
                        score: 0.0,
                        category: "general".to_string(),
                        admitted: false,
                    }
                }
            })
            .collect()
    }
}

/// Articles with no image are auto-rejected before ever reaching the LLM.
pub fn filter_has_image<'a, T>(
    candidates: &'a [T],
    has_image: impl Fn(&T) -> bool,
) -> Vec<&'a T> {
    let kept: Vec<&T> = candidates.iter().filter(|c| has_image(c)).collect();
    if kept.len() < candidates.len() {
        info!(
            dropped = candidates.len() - kept.len(),
            "auto-rejected articles with no image before scoring"
        );
    }
    kept
}

fn build_prompt(candidates: &[ScoreCandidate]) -> String {
    let entries = candidates
        .iter()
        .map(|c| {
            format!(
                "- id: {}\n  source: {} (credibility {}/10)\n  title: {}\n  description: {}",
                c.id, c.source_name, c.credibility, c.title, c.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Score each candidate article below. For each, return its id, a numeric score, \
         and a coarse category label.\n\nCandidates:\n{entries}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_out_candidates_without_images() {
        let candidates = vec![("a", true), ("b", false), ("c", true)];
        let kept = filter_has_image(&candidates, |c| c.1);
        assert_eq!(kept.len(), 2);
    }
}
