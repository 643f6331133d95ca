//! Permissive JSON extraction for LLM output.
//!
//! LLM responses are not reliably well-formed JSON: they arrive wrapped in
//! markdown fences, preceded/followed by prose, or truncated mid-array when
//! the model hits its output limit. This module centralises the recovery
//! rules every LLM-facing stage needs instead of repeating ad-hoc repair
//! logic at each call site.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Strip surrounding markdown code fences (```json ... ``` or ``` ... ```).
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Find the largest balanced `{...}` or `[...]` span in `text`, ignoring any
/// prose before or after it. Returns `None` if no balanced span is found.
pub fn largest_balanced_span(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut best: Option<(usize, usize)> = None;

    for (start, &b) in bytes.iter().enumerate() {
        let (open, close) = match b {
            b'{' => (b'{', b'}'),
            b'[' => (b'[', b']'),
            _ => continue,
        };
        let mut depth = 0i32;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, &c) in bytes[start..].iter().enumerate() {
            if in_string {
                if escaped {
                    escaped = false;
                } else if c == b'\\' {
                    escaped = true;
                } else if c == b'"' {
                    in_string = false;
                }
                continue;
            }
            match c {
                b'"' => in_string = true,
                c if c == open => depth += 1,
                c if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + offset + 1;
                        let len = end - start;
                        if best.map(|(s, e)| e - s < len).unwrap_or(true) {
                            best = Some((start, end));
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    best.map(|(s, e)| &text[s..e])
}

/// Recover every syntactically-complete element from a JSON array that may
/// be truncated mid-element (the model ran out of output tokens). Returns
/// the elements parsed so far; never errors on a truncated tail.
pub fn recover_truncated_array(text: &str) -> Vec<Value> {
    let trimmed = text.trim().trim_start_matches('[');
    let mut out = Vec::new();
    let mut stream = serde_json::Deserializer::from_str(trimmed).into_iter::<Value>();
    for item in &mut stream {
        match item {
            Ok(v) => out.push(v),
            Err(_) => break,
        }
    }
    out
}

/// Extract a `T` from a raw LLM response, applying the full recovery chain:
/// strip fences, try direct parse, fall back to the largest balanced span.
pub fn extract<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    let stripped = strip_code_blocks(raw);
    if let Ok(v) = serde_json::from_str::<T>(stripped) {
        return Ok(v);
    }
    let span = largest_balanced_span(stripped)
        .ok_or_else(|| anyhow::anyhow!("no JSON object or array found in response"))?;
    serde_json::from_str::<T>(span)
        .map_err(|e| anyhow::anyhow!("failed to parse extracted JSON span: {e}"))
}

/// Extract as many complete `T` array elements as possible from a raw LLM
/// response, tolerating truncation. Returns an empty vec if nothing usable
/// is found — callers should treat that as a schema/parse failure (error
/// kind 3) and drop the batch with a counter, never substituting invented
/// data.
pub fn extract_array<T: DeserializeOwned>(raw: &str) -> Vec<T> {
    let stripped = strip_code_blocks(raw);
    let span = largest_balanced_span(stripped).unwrap_or(stripped);
    recover_truncated_array(span)
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
        score: f64,
    }

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_blocks("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strips_plain_fence() {
        assert_eq!(strip_code_blocks("```\n[]\n```"), "[]");
    }

    #[test]
    fn extracts_object_with_surrounding_prose() {
        let raw = "Sure, here is the result:\n{\"id\":1,\"score\":2.5}\nLet me know if you need more.";
        let item: Item = extract(raw).unwrap();
        assert_eq!(item, Item { id: 1, score: 2.5 });
    }

    #[test]
    fn extracts_array_with_fences() {
        let raw = "```json\n[{\"id\":1,\"score\":1.0},{\"id\":2,\"score\":2.0}]\n```";
        let items: Vec<Item> = extract_array(raw);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, 2);
    }

    #[test]
    fn recovers_complete_objects_from_truncated_array() {
        let raw = r#"[{"id":1,"score":1.0},{"id":2,"score":2.0},{"id":3,"sco"#;
        let items: Vec<Item> = extract_array(raw);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[1].id, 2);
    }

    #[test]
    fn largest_balanced_span_ignores_prose_braces() {
        let raw = "note: {not json} but here {\"a\": {\"b\": 1}}";
        let span = largest_balanced_span(raw).unwrap();
        assert_eq!(span, "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn extract_array_empty_on_garbage() {
        let items: Vec<Item> = extract_array("not json at all");
        assert!(items.is_empty());
    }
}
