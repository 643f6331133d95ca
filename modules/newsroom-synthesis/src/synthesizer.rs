use ai_client::claude::Claude;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::retry::llm_call;

const SYSTEM_PROMPT: &str = "You are a newswire editor synthesizing one article from \
    multiple source reports about the same event. Write as firsthand reporting — never \
    phrase things as \"reports say\" or \"according to sources\". When sources conflict, \
    prefer the report with the newer timestamp; if still contradictory, attribute the \
    claim inline to the higher-credibility source. Respond only with structured JSON \
    matching the schema.";

const MIN_WORDS: usize = 300;
const MAX_WORDS: usize = 400;
const MAX_SYNTHESIS_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct SourceText {
    pub source_name: String,
    pub credibility: u8,
    pub published_at: Option<DateTime<Utc>>,
    /// Full text if the fetcher succeeded, otherwise the feed description.
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SynthesisResponse {
    pub title: String,
    /// Exactly 4 entries, each 15-25 words.
    pub summary_bullets: Vec<String>,
    /// 300-400 words.
    pub content_standard: String,
    /// 300-400 words, B2 reading level.
    pub content_b2: String,
    pub keywords: Vec<String>,
    pub category: String,
}

pub struct Synthesis {
    pub title: String,
    pub summary_bullets: Vec<String>,
    pub content_standard: String,
    pub content_b2: String,
    pub keywords: Vec<String>,
    pub category: String,
}

/// Multi-Source Synthesizer (C8).
pub struct Synthesizer {
    claude: Claude,
}

impl Synthesizer {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }

    /// Synthesizes one article from a cluster's member sources. `None`
    /// means the synthesis failed the word-count bounds on every retry and
    /// the cluster stays unpublished for this cycle.
    pub async fn synthesize(
        &self,
        cluster_title: &str,
        sources: &[SourceText],
    ) -> anyhow::Result<Option<Synthesis>> {
        let mut newest_first = sources.to_vec();
        newest_first.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let prompt = build_prompt(cluster_title, &newest_first);

        for attempt in 0..MAX_SYNTHESIS_ATTEMPTS {
            let response: SynthesisResponse = llm_call("synthesizer.synthesize", || {
                self.claude.extract_with_temperature(SYSTEM_PROMPT, &prompt, 0.2)
            })
            .await?;

            if word_count_ok(&response.content_standard) && word_count_ok(&response.content_b2) {
                info!(title = response.title, attempt, "synthesis within word bounds");
                return Ok(Some(Synthesis {
                    title: response.title,
                    summary_bullets: response.summary_bullets,
                    content_standard: response.content_standard,
                    content_b2: response.content_b2,
                    keywords: response.keywords,
                    category: response.category,
                }));
            }

            warn!(
                attempt,
                standard_words = word_count(&response.content_standard),
                b2_words = word_count(&response.content_b2),
                "synthesis out of word-count bounds, retrying"
            );
        }

        warn!(cluster_title, "synthesis rejected after exhausting retries");
        Ok(None)
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn word_count_ok(text: &str) -> bool {
    (MIN_WORDS..=MAX_WORDS).contains(&word_count(text))
}

fn build_prompt(cluster_title: &str, sources: &[SourceText]) -> String {
    let source_blocks = sources
        .iter()
        .map(|s| {
            let published = s
                .published_at
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| "unknown time".to_string());
            format!(
                "### {} (credibility {}/10, published {})\n{}",
                s.source_name, s.credibility, published, s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Story cluster: \"{cluster_title}\"\n\nSource reports, newest first:\n\n{source_blocks}\n\n\
         Write:\n\
         1. title: a clear, specific headline.\n\
         2. summary_bullets: exactly 4 bullets, each 15-25 words, covering what/where/when, who, impact, and context.\n\
         3. content_standard: 300-400 words of firsthand reporting.\n\
         4. content_b2: 300-400 words at a B2 English reading level, covering the same facts.\n\
         5. keywords: distinctive terms for this story.\n\
         6. category: a coarse topical label."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_bounds() {
        let ok = "word ".repeat(350);
        assert!(word_count_ok(&ok));

        let short = "word ".repeat(100);
        assert!(!word_count_ok(&short));

        let long = "word ".repeat(500);
        assert!(!word_count_ok(&long));
    }
}
