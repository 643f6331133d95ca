use url::Url;

/// Query parameters stripped during normalization — purely tracking noise
/// that does not change the resource identified by the URL.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "source",
    "fbclid",
    "gclid",
    "_ga",
    "mc_cid",
    "mc_eid",
];

/// URL Normalizer (C3). Lower-cases the host, strips a leading `www.`,
/// removes tracking query parameters, drops the fragment, and sorts the
/// remaining query keys by name. Falls back to the input string unchanged
/// if it does not parse as a URL at all.
pub fn normalize(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        let stripped = lower.strip_prefix("www.").unwrap_or(&lower).to_string();
        let _ = url.set_host(Some(&stripped));
    }

    let mut kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    kept.sort_by(|a, b| a.0.cmp(&b.0));

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    url.set_fragment(None);
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_host_and_strips_www() {
        assert_eq!(
            normalize("https://WWW.Example.com/a"),
            "https://example.com/a"
        );
    }

    #[test]
    fn strips_tracking_params_and_fragment() {
        let normalized = normalize(
            "https://example.com/a?utm_source=x&id=5&fbclid=y#section",
        );
        assert_eq!(normalized, "https://example.com/a?id=5");
    }

    #[test]
    fn sorts_remaining_query_keys() {
        assert_eq!(
            normalize("https://example.com/a?z=1&a=2"),
            "https://example.com/a?a=2&z=1"
        );
    }

    #[test]
    fn unparseable_input_is_returned_unchanged() {
        assert_eq!(normalize("not a url"), "not a url");
    }
}
