use std::collections::HashMap;

use newsroom_common::{Source, DEFAULT_CREDIBILITY};

/// Source Catalogue (C1). Loaded once at startup from a JSON document and
/// held immutable for the process lifetime — there is no mutation path.
#[derive(Debug, Clone)]
pub struct Catalogue {
    sources: Vec<Source>,
    credibility_by_name: HashMap<String, u8>,
}

impl Catalogue {
    pub fn new(sources: Vec<Source>) -> Self {
        let credibility_by_name = sources
            .iter()
            .map(|s| (s.name.clone(), s.credibility))
            .collect();
        Self {
            sources,
            credibility_by_name,
        }
    }

    /// Parse a catalogue from a JSON array of `Source` records.
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let sources: Vec<Source> = serde_json::from_str(raw)?;
        Ok(Self::new(sources))
    }

    pub fn list_sources(&self) -> &[Source] {
        &self.sources
    }

    /// Credibility for a known source name, `DEFAULT_CREDIBILITY` otherwise.
    pub fn credibility(&self, name: &str) -> u8 {
        self.credibility_by_name
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_CREDIBILITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_source_gets_default_credibility() {
        let catalogue = Catalogue::new(vec![Source {
            name: "Known Wire".into(),
            feed_url: "https://example.com/rss".into(),
            category: "general".into(),
            credibility: 9,
        }]);

        assert_eq!(catalogue.credibility("Known Wire"), 9);
        assert_eq!(catalogue.credibility("Unheard Of Blog"), DEFAULT_CREDIBILITY);
    }

    #[test]
    fn parses_json_catalogue() {
        let raw = r#"[{"name":"Wire","feed_url":"https://x/rss","category":"general","credibility":7}]"#;
        let catalogue = Catalogue::from_json(raw).unwrap();
        assert_eq!(catalogue.list_sources().len(), 1);
        assert_eq!(catalogue.credibility("Wire"), 7);
    }
}
