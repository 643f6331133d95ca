use ai_client::claude::Claude;
use newsroom_common::{DetailEntry, GraphComponent, MapAnchor, TimelineEvent};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use crate::retry::llm_call;

const SYSTEM_PROMPT: &str = "You enrich a synthesized news article with optional \
    components, grounded only in verifiable facts. Omit any component you cannot \
    ground with a real, citable source. Respond only with structured JSON matching \
    the schema.";

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EnrichmentResponse {
    pub timeline: Option<Vec<TimelineEvent>>,
    pub details: Option<Vec<DetailEntry>>,
    pub graph: Option<GraphComponent>,
    pub map: Option<MapAnchor>,
}

#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub timeline: Option<Vec<TimelineEvent>>,
    pub details: Option<Vec<DetailEntry>>,
    pub graph: Option<GraphComponent>,
    pub map: Option<MapAnchor>,
}

/// Component Enricher (C9). Selection is needs-based: the LLM decides
/// whether a component applies at all, and this layer validates the shape
/// of whatever comes back, dropping anything that fails rather than
/// publishing a malformed or weak component.
pub struct Enricher {
    claude: Claude,
}

impl Enricher {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }

    pub async fn enrich(
        &self,
        title: &str,
        summary_bullets: &[String],
        content_standard: &str,
    ) -> anyhow::Result<Enrichment> {
        let prompt = build_prompt(title, summary_bullets, content_standard);

        let response: EnrichmentResponse = llm_call("enricher.enrich", || {
            self.claude.extract_with_temperature(SYSTEM_PROMPT, &prompt, 0.2)
        })
        .await?;

        Ok(Enrichment {
            timeline: response
                .timeline
                .filter(|events| validate_timeline(title, events)),
            details: response.details.filter(|entries| validate_details(entries)),
            graph: response.graph.filter(|g| validate_graph(g)),
            map: response.map,
        })
    }
}

fn validate_timeline(title: &str, events: &[TimelineEvent]) -> bool {
    if !(2..=4).contains(&events.len()) {
        warn!(count = events.len(), "dropping timeline: wrong event count");
        return false;
    }
    for event in events {
        if word_count(&event.description) > 14 {
            warn!(description = event.description, "dropping timeline: event too long");
            return false;
        }
        if event.description.eq_ignore_ascii_case(title) {
            warn!("dropping timeline: event repeats headline");
            return false;
        }
    }
    true
}

fn validate_details(entries: &[DetailEntry]) -> bool {
    if entries.len() != 3 {
        warn!(count = entries.len(), "dropping details: must be exactly 3 entries");
        return false;
    }
    entries.iter().all(|e| {
        let label_words = word_count(&e.label);
        let total_words = word_count(&e.label) + word_count(&e.value);
        if label_words == 0 || label_words > 3 || total_words > 8 {
            warn!(label = e.label, "dropping details: entry out of bounds");
            false
        } else {
            true
        }
    })
}

fn validate_graph(graph: &GraphComponent) -> bool {
    if graph.points.len() < 4 {
        warn!(points = graph.points.len(), "dropping graph: too few datapoints");
        return false;
    }
    if graph.source.trim().is_empty() {
        warn!("dropping graph: missing source attribution");
        return false;
    }
    true
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn build_prompt(title: &str, summary_bullets: &[String], content_standard: &str) -> String {
    format!(
        "Article title: {title}\n\nSummary bullets:\n{}\n\nFull article:\n{content_standard}\n\n\
         Decide which optional components genuinely apply:\n\
         - timeline: only if this is an ongoing/multi-event story. 2-4 chronological events, \
           each <=14 words, not repeating the headline.\n\
         - details: exactly 3 label:value entries not already present in the title or bullets, \
           label 1-3 words, label+value <=8 words total.\n\
         - graph: only if there is a real citable numeric series. At least 4 datapoints with a \
           named source.\n\
         - map: only if there is one specific newsworthy location (not a generic city/country \
           mention or a famous government building).\n\
         Omit any component that does not clearly apply.",
        summary_bullets.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsroom_common::GraphPoint;

    #[test]
    fn rejects_details_with_wrong_count() {
        let entries = vec![
            DetailEntry { label: "deaths".into(), value: "12".into() },
            DetailEntry { label: "injured".into(), value: "40".into() },
        ];
        assert!(!validate_details(&entries));
    }

    #[test]
    fn rejects_graph_with_too_few_points() {
        let graph = GraphComponent {
            title: "Cases over time".into(),
            source: "WHO".into(),
            points: vec![GraphPoint { label: "Jan".into(), value: 1.0 }],
        };
        assert!(!validate_graph(&graph));
    }

    #[test]
    fn accepts_well_formed_graph() {
        let graph = GraphComponent {
            title: "Cases over time".into(),
            source: "WHO".into(),
            points: (0..4)
                .map(|i| GraphPoint { label: format!("Month {i}"), value: i as f64 })
                .collect(),
        };
        assert!(validate_graph(&graph));
    }
}
