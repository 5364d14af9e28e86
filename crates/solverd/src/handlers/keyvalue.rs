//! key=value text to JSON object conversion.

use serde_json::{Map, Number, Value};
use std::path::Path;

use crate::files;

/// Convert a text file of `key=value` lines into a compact JSON object.
pub fn convert_file(path: &Path) -> String {
    match files::read_text(path) {
        Ok(content) => convert_text(&content),
        Err(e) => format!("Error converting key-value pairs to JSON: {}", e),
    }
}

/// Convert `key=value` lines into a compact JSON object, keeping keys in
/// file order. Lines without `=` are skipped.
pub fn convert_text(content: &str) -> String {
    let mut object = Map::new();

    for line in content.trim().lines() {
        if let Some((key, value)) = line.split_once('=') {
            object.insert(key.trim().to_string(), infer_value(value.trim()));
        }
    }

    serde_json::to_string(&Value::Object(object))
        .unwrap_or_else(|e| format!("Error converting key-value pairs to JSON: {}", e))
}

/// Infer a value's type in strict order: integer if all-digit, else
/// float, else boolean literal, else comma-split list, else raw string.
fn infer_value(raw: &str) -> Value {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<i64>() {
            return Value::Number(n.into());
        }
    }

    if let Ok(f) = raw.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }

    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    if raw.contains(',') {
        let items: Vec<&str> = raw.split(',').collect();
        if items.len() > 1 {
            return Value::Array(
                items
                    .into_iter()
                    .map(|item| Value::String(item.trim().to_string()))
                    .collect(),
            );
        }
    }

    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_inference_order() {
        assert_eq!(infer_value("42"), Value::from(42));
        assert_eq!(infer_value("3.5"), Value::from(3.5));
        assert_eq!(infer_value("TRUE"), Value::Bool(true));
        assert_eq!(infer_value("false"), Value::Bool(false));
        assert_eq!(infer_value("x,y"), serde_json::json!(["x", "y"]));
        assert_eq!(infer_value("plain"), Value::from("plain"));
    }

    #[test]
    fn test_reference_conversion() {
        assert_eq!(
            convert_text("foo=1\nbar=true\nbaz=x,y"),
            r#"{"foo":1,"bar":true,"baz":["x","y"]}"#
        );
    }

    #[test]
    fn test_keys_keep_file_order() {
        assert_eq!(convert_text("z=1\na=2"), r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn test_value_may_contain_equals() {
        // Only the first '=' splits key from value
        assert_eq!(convert_text("eq=a=b"), r#"{"eq":"a=b"}"#);
    }

    #[test]
    fn test_lines_without_equals_skipped() {
        assert_eq!(convert_text("# comment\nkey=value"), r#"{"key":"value"}"#);
    }

    #[test]
    fn test_list_items_trimmed() {
        assert_eq!(
            convert_text("list= a , b , c "),
            r#"{"list":["a","b","c"]}"#
        );
    }
}
