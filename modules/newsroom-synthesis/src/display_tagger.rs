use ai_client::claude::Claude;
use newsroom_common::vocab::{default_topic_for_category, filter_countries, filter_topics};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use crate::retry::llm_call;

const SCORE_SYSTEM_PROMPT: &str = "You are a wire editor assigning a display-prominence \
    score on a 0-1000 scale, calibrated against the reference articles provided: 1000 is \
    front-page, world-changing news, 0 is filler. Respond only with structured JSON \
    matching the schema.";

const TAG_SYSTEM_PROMPT: &str = "You tag a news article with the countries and topics it \
    concerns, drawn only from the closed vocabularies given. Respond only with structured \
    JSON matching the schema.";

/// Default display score applied when the LLM returns something out of
/// range or unparseable — the median of the 0-1000 scale.
const DEFAULT_DISPLAY_SCORE: f64 = 750.0;

#[derive(Debug, Clone)]
pub struct ReferenceAnchor {
    pub title: String,
    pub display_score: f64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct DisplayScoreResponse {
    score: f64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
struct TagResponse {
    countries: Vec<String>,
    topics: Vec<String>,
}

pub struct Tags {
    pub countries: Vec<String>,
    pub topics: Vec<String>,
}

/// Scorer-for-Display & Tagger (C10). Two independent LLM calls: one rates
/// display prominence against calibration anchors, the other assigns tags
/// that are then filtered down to the closed vocabularies.
pub struct DisplayTagger {
    claude: Claude,
}

impl DisplayTagger {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }

    pub async fn score_display(
        &self,
        title: &str,
        summary_bullets: &[String],
        anchors: &[ReferenceAnchor],
    ) -> f64 {
        let prompt = build_score_prompt(title, summary_bullets, anchors);

        let result: anyhow::Result<DisplayScoreResponse> = llm_call("display_tagger.score", || {
            self.claude.extract_with_temperature(SCORE_SYSTEM_PROMPT, &prompt, 0.0)
        })
        .await;

        match result {
            Ok(response) if (0.0..=1000.0).contains(&response.score) => response.score,
            Ok(response) => {
                warn!(score = response.score, "display score out of range, using default");
                DEFAULT_DISPLAY_SCORE
            }
            Err(e) => {
                warn!(error = %e, "display scoring failed persistently, using default");
                DEFAULT_DISPLAY_SCORE
            }
        }
    }

    pub async fn tag(&self, title: &str, content_standard: &str, category: &str) -> Tags {
        let prompt = build_tag_prompt(title, content_standard);

        let result: anyhow::Result<TagResponse> = llm_call("display_tagger.tag", || {
            self.claude.extract_with_temperature(TAG_SYSTEM_PROMPT, &prompt, 0.0)
        })
        .await;

        match result {
            Ok(response) => Tags {
                countries: filter_countries(&response.countries),
                topics: filter_topics(&response.topics, category),
            },
            Err(e) => {
                warn!(error = %e, "tagging failed persistently, falling back to category default");
                Tags {
                    countries: Vec::new(),
                    topics: vec![default_topic_for_category(category).to_string()],
                }
            }
        }
    }
}

fn build_score_prompt(title: &str, summary_bullets: &[String], anchors: &[ReferenceAnchor]) -> String {
    let anchor_block = if anchors.is_empty() {
        "No reference anchors available; use your own judgment.".to_string()
    } else {
        anchors
            .iter()
            .map(|a| format!("- \"{}\" scored {}", a.title, a.display_score))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Article title: {title}\n\nSummary bullets:\n{}\n\nCalibration anchors:\n{anchor_block}\n\n\
         Return a single integer score from 0 to 1000.",
        summary_bullets.join("\n")
    )
}

fn build_tag_prompt(title: &str, content_standard: &str) -> String {
    format!(
        "Article title: {title}\n\nFull article:\n{content_standard}\n\n\
         Return up to 3 country codes and up to 3 topic codes that apply, drawn only from \
         the vocabularies the system defines."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_prompt_handles_no_anchors() {
        let prompt = build_score_prompt("Title", &["a bullet".to_string()], &[]);
        assert!(prompt.contains("own judgment"));
    }

    #[test]
    fn score_prompt_includes_anchor_titles() {
        let anchors = vec![ReferenceAnchor { title: "Major quake hits region".into(), display_score: 900.0 }];
        let prompt = build_score_prompt("Title", &["b".to_string()], &anchors);
        assert!(prompt.contains("Major quake hits region"));
    }
}
