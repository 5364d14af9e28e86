//! JSON sorting and key-path extraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::cmp::Ordering;

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Sort a JSON array of objects and re-serialize with no whitespace.
///
/// Sort keys are inferred from the data: if any element carries `age` and
/// any carries `name`, sort by `(age, name)`; if only one of the two
/// appears anywhere, sort by it alone; otherwise leave the order as-is.
/// The sort is stable, so equal keys keep their input order.
pub fn sort_json(json_str: &str) -> String {
    let data: Value = match serde_json::from_str(json_str.trim()) {
        Ok(data) => data,
        Err(e) => return format!("Error parsing JSON: {}", e),
    };

    let Value::Array(mut items) = data else {
        return format!("Error: Expected a JSON array, got {}", type_name(&data));
    };

    let has_age = items.iter().any(|item| item.get("age").is_some());
    let has_name = items.iter().any(|item| item.get("name").is_some());

    if has_age && has_name {
        items.sort_by(|a, b| cmp_age(a, b).then_with(|| cmp_name(a, b)));
    } else if has_age {
        items.sort_by(cmp_age);
    } else if has_name {
        items.sort_by(cmp_name);
    }

    serde_json::to_string(&Value::Array(items)).unwrap_or_else(|e| {
        format!("Error processing JSON: {}", e)
    })
}

fn cmp_age(a: &Value, b: &Value) -> Ordering {
    let age = |v: &Value| v.get("age").and_then(Value::as_f64).unwrap_or(0.0);
    age(a).partial_cmp(&age(b)).unwrap_or(Ordering::Equal)
}

fn cmp_name(a: &Value, b: &Value) -> Ordering {
    let name = |v: &Value| {
        v.get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };
    name(a).cmp(&name(b))
}

static KEY_PATH_PARTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w+)|\[(\d+)\]").unwrap());

/// Walk a dotted/bracket key path (`a.b[0].c`) through parsed JSON.
///
/// A missing intermediate key yields an empty-object traversal rather
/// than an error - explicit leniency policy. An out-of-range index is a
/// hard error with the offending index named.
pub fn extract_key_path(json_str: &str, key_path: &str) -> String {
    let data: Value = match serde_json::from_str(json_str) {
        Ok(data) => data,
        Err(e) => return format!("Error extracting from JSON: {}", e),
    };

    let mut value = data;
    for caps in KEY_PATH_PARTS.captures_iter(key_path) {
        if let Some(name) = caps.get(1) {
            value = value.get(name.as_str()).cloned().unwrap_or_else(|| json!({}));
        } else if let Some(index) = caps.get(2) {
            let i: usize = match index.as_str().parse() {
                Ok(i) => i,
                Err(e) => return format!("Error extracting from JSON: {}", e),
            };
            match value.as_array() {
                Some(items) if i < items.len() => value = items[i].clone(),
                _ => return format!("Error: Index {} out of range", i),
            }
        }
    }

    match value {
        Value::String(s) => s,
        other => serde_json::to_string(&other)
            .unwrap_or_else(|e| format!("Error extracting from JSON: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_age_then_name() {
        let input = r#"[{"name":"Alice","age":55},{"name":"Bob","age":30},{"name":"Charlie","age":55}]"#;
        assert_eq!(
            sort_json(input),
            r#"[{"name":"Bob","age":30},{"name":"Alice","age":55},{"name":"Charlie","age":55}]"#
        );
    }

    #[test]
    fn test_sort_is_idempotent() {
        let input = r#"[{"name":"Alice","age":55},{"name":"Bob","age":30},{"name":"Charlie","age":55}]"#;
        let once = sort_json(input);
        assert_eq!(sort_json(&once), once);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let input = r#"[{"name":"A","age":1,"tag":"first"},{"name":"A","age":1,"tag":"second"}]"#;
        let sorted = sort_json(input);
        let first = sorted.find("first").unwrap();
        let second = sorted.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_sort_by_name_only() {
        let input = r#"[{"name":"b"},{"name":"a"}]"#;
        assert_eq!(sort_json(input), r#"[{"name":"a"},{"name":"b"}]"#);
    }

    #[test]
    fn test_no_known_keys_preserves_order() {
        let input = r#"[{"x":2},{"x":1}]"#;
        assert_eq!(sort_json(input), r#"[{"x":2},{"x":1}]"#);
    }

    #[test]
    fn test_sort_rejects_non_array() {
        assert_eq!(
            sort_json(r#"{"name":"Alice"}"#),
            "Error: Expected a JSON array, got object"
        );
        assert!(sort_json("not json at all").starts_with("Error parsing JSON:"));
    }

    #[test]
    fn test_key_path_present() {
        let data = r#"{"data":{"results":[{"name":"first"},{"name":"second"}]}}"#;
        assert_eq!(extract_key_path(data, "data.results[1].name"), "second");
    }

    #[test]
    fn test_key_path_missing_key_is_lenient() {
        // Missing intermediate keys default to {} instead of erroring
        assert_eq!(extract_key_path(r#"{"a":1}"#, "b.c"), "{}");
    }

    #[test]
    fn test_key_path_index_out_of_range() {
        let data = r#"{"items":[1,2]}"#;
        assert_eq!(
            extract_key_path(data, "items[5]"),
            "Error: Index 5 out of range"
        );
    }

    #[test]
    fn test_key_path_returns_subtree_compact() {
        let data = r#"{"a":{"b":[10,20]}}"#;
        assert_eq!(extract_key_path(data, "a"), r#"{"b":[10,20]}"#);
        assert_eq!(extract_key_path(data, "a.b[0]"), "10");
    }
}
