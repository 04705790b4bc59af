//! JSON recovery from model output
//!
//! Models wrap JSON in prose or markdown fences. Recovery tries the whole
//! text first, then the widest `{`/`[` … `}`/`]` span.

use serde::de::DeserializeOwned;

/// Parse `text` as JSON, falling back to the widest embedded object/array.
///
/// Returns `None` when neither attempt yields a `T`; never panics.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Some(value);
    }

    let candidate = embedded_span(trimmed)?;
    serde_json::from_str::<T>(candidate).ok()
}

/// Greedy span from the first opening bracket to the last closing one.
fn embedded_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let end = text.rfind(['}', ']'])?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[test]
    fn test_direct_parse() {
        let value: Value = extract_json(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_embedded_array() {
        let value: Value = extract_json("garbage [[1,2],[3,4]] trailing").unwrap();
        assert_eq!(value, json!([[1, 2], [3, 4]]));
    }

    #[test]
    fn test_markdown_fence() {
        let text = "Here you go:\n```json\n{\"summary\": \"went hiking\"}\n```\nAnything else?";
        let value: Value = extract_json(text).unwrap();
        assert_eq!(value["summary"], "went hiking");
    }

    #[test]
    fn test_not_json() {
        assert!(extract_json::<Value>("not json at all").is_none());
        assert!(extract_json::<Value>("").is_none());
    }

    #[test]
    fn test_unbalanced_brackets() {
        assert!(extract_json::<Value>("oops ] then [").is_none());
        assert!(extract_json::<Value>("[1, 2").is_none());
    }

    #[test]
    fn test_greedy_span_spanning_two_values_fails() {
        // Greedy matching joins both objects, which is not valid JSON.
        assert!(extract_json::<Value>("{\"a\":1} and {\"b\":2}").is_none());
    }

    #[test]
    fn test_typed_extraction() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Groups(Vec<Vec<u32>>);

        let groups: Groups = extract_json("Clusters: [[1],[2,3]]").unwrap();
        assert_eq!(groups, Groups(vec![vec![1], vec![2, 3]]));

        // Right shape of brackets, wrong element type
        assert!(extract_json::<Groups>("[[\"x\"]]").is_none());
    }
}
