//! Text renderings of a record's data

use serde_json::Value;

/// One-line rendering: strings and numbers as-is, everything else as
/// compact JSON, separated by single spaces
pub fn data_to_text(data: &[Value]) -> String {
    data.iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expanded rendering: one block per value, structured values pretty-printed
pub fn data_to_pretty(data: &[Value]) -> String {
    data.iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text that free-text search runs against: the whole data array as compact JSON
pub fn search_text(data: &[Value]) -> String {
    serde_json::to_string(data).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_to_text() {
        let data = vec![json!("call"), json!(42), json!({"id": 7}), json!(null), json!([1, 2])];
        assert_eq!(data_to_text(&data), r#"call 42 {"id":7} null [1,2]"#);
    }

    #[test]
    fn test_data_to_text_empty() {
        assert_eq!(data_to_text(&[]), "");
    }

    #[test]
    fn test_data_to_pretty() {
        let data = vec![json!("peer"), json!({"id": 7})];
        assert_eq!(data_to_pretty(&data), "peer\n{\n  \"id\": 7\n}");
    }

    #[test]
    fn test_search_text_quotes_strings() {
        let data = vec![json!("a b"), json!({"x": 1})];
        assert_eq!(search_text(&data), r#"["a b",{"x":1}]"#);
    }
}
