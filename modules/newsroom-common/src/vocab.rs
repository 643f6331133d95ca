//! Closed tag vocabularies used by the Tagger (C10). Any code the LLM
//! produces outside these lists is dropped rather than passed through.

/// The 22 country codes the Tagger may assign.
pub const COUNTRIES: &[&str] = &[
    "us", "gb", "fr", "de", "it", "es", "ru", "ua", "cn", "jp", "kr", "in",
    "br", "mx", "ca", "au", "za", "eg", "il", "sa", "ir", "tr",
];

/// The 29 topic codes the Tagger may assign.
pub const TOPICS: &[&str] = &[
    "politics", "economy", "business", "technology", "science", "health",
    "environment", "climate", "war-conflict", "disaster", "crime", "justice",
    "human-rights", "migration", "elections", "diplomacy", "energy",
    "markets", "labor", "education", "culture", "sports", "entertainment",
    "space", "military", "infrastructure", "cyber", "religion", "society",
];

pub fn is_known_country(code: &str) -> bool {
    COUNTRIES.contains(&code)
}

pub fn is_known_topic(code: &str) -> bool {
    TOPICS.contains(&code)
}

/// Keep only codes present in the closed country vocabulary, capped at 3,
/// preserving the LLM's ordering.
pub fn filter_countries(codes: &[String]) -> Vec<String> {
    codes
        .iter()
        .map(|c| c.to_lowercase())
        .filter(|c| is_known_country(c))
        .take(3)
        .collect()
}

/// Keep only codes present in the closed topic vocabulary, capped at 3. If
/// the result is empty, falls back to `default_topic_for_category`.
pub fn filter_topics(codes: &[String], category: &str) -> Vec<String> {
    let mut kept: Vec<String> = codes
        .iter()
        .map(|c| c.to_lowercase())
        .filter(|c| is_known_topic(c))
        .take(3)
        .collect();
    if kept.is_empty() {
        kept.push(default_topic_for_category(category).to_string());
    }
    kept
}

/// Deterministic fallback mapping from a coarse article category to a
/// default topic, used when the Tagger produces no valid topic.
pub fn default_topic_for_category(category: &str) -> &'static str {
    match category.to_lowercase().as_str() {
        "politics" | "government" | "election" => "politics",
        "business" | "finance" => "business",
        "economy" | "economics" | "trade" => "economy",
        "technology" | "tech" => "technology",
        "science" => "science",
        "health" | "medicine" | "pandemic" => "health",
        "environment" | "climate" => "environment",
        "war" | "conflict" | "security" => "war-conflict",
        "disaster" | "weather" => "disaster",
        "crime" | "legal" => "crime",
        "sports" => "sports",
        "entertainment" | "culture" => "culture",
        _ => "society",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_countries_caps_at_three_and_lowercases() {
        let codes = vec!["US".into(), "gb".into(), "fr".into(), "de".into()];
        let out = filter_countries(&codes);
        assert_eq!(out, vec!["us", "gb", "fr"]);
    }

    #[test]
    fn filter_countries_drops_unknown() {
        let codes = vec!["xx".into(), "us".into()];
        assert_eq!(filter_countries(&codes), vec!["us"]);
    }

    #[test]
    fn filter_topics_falls_back_when_empty() {
        let codes = vec!["not-a-topic".into()];
        assert_eq!(filter_topics(&codes, "business"), vec!["business"]);
    }

    #[test]
    fn filter_topics_keeps_known_codes() {
        let codes = vec!["technology".into(), "bogus".into()];
        assert_eq!(filter_topics(&codes, "general"), vec!["technology"]);
    }

    #[test]
    fn default_topic_for_unknown_category_is_society() {
        assert_eq!(default_topic_for_category("something-weird"), "society");
    }
}
