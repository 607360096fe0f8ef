use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use callscope_types::LogEntry;

/// Errors from reading a call-log file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file is not valid JSON")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of log entries, found {found}")]
    NotAnArray { found: &'static str },

    #[error("entry {index} is {found}, not a log entry object")]
    Entry { index: usize, found: &'static str },
}

/// Parse call-log file content into entries.
///
/// The root must be an array. Elements that are themselves arrays are
/// spliced in place, one level deep only; `index` in [`LoadError::Entry`]
/// counts positions after that flattening.
///
/// Any JSON object is accepted as an entry. Its fields are not validated.
pub fn parse_log_file(content: &str) -> Result<Vec<LogEntry>, LoadError> {
    let root: Value = serde_json::from_str(content)?;
    let Value::Array(items) = root else {
        return Err(LoadError::NotAnArray {
            found: json_kind(&root),
        });
    };

    let entries = flatten_one_level(items)
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(_) => Ok(serde_json::from_value(item)?),
            other => Err(LoadError::Entry {
                index,
                found: json_kind(&other),
            }),
        })
        .collect::<Result<Vec<LogEntry>, _>>()?;

    debug!(entries = entries.len(), "parsed log file");
    Ok(entries)
}

/// Read and parse a call-log file
pub async fn load_log_file(path: impl AsRef<Path>) -> Result<Vec<LogEntry>, LoadError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_log_file(&content)
}

fn flatten_one_level(items: Vec<Value>) -> Vec<Value> {
    let mut flat = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(nested) => flat.extend(nested),
            other => flat.push(other),
        }
    }
    flat
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscope_types::LogLevel;
    use serde_json::json;

    #[test]
    fn test_parse_flat_file() {
        let content = r#"[{"l":"log","h":"10:00","d":["a"]},{"l":"error","h":"10:01","d":[{"x":1}]}]"#;
        let entries = parse_log_file(content).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level(), LogLevel::Log);
        assert_eq!(entries[1].data(), [json!({"x": 1})]);
    }

    #[test]
    fn test_parse_flattens_one_level() {
        let content = r#"[
            {"l":"debug","h":"1","d":[]},
            [{"l":"log","h":"2","d":[]},{"l":"warn","h":"3","d":[]}],
            {"l":"error","h":"4","d":[]}
        ]"#;
        let entries = parse_log_file(content).unwrap();
        let stamps: Vec<_> = entries.iter().map(|e| e.timestamp()).collect();
        assert_eq!(stamps, ["1", "2", "3", "4"]);
    }

    #[test]
    fn test_parse_rejects_deeper_nesting() {
        let content = r#"[[[{"l":"log","h":"1","d":[]}]]]"#;
        match parse_log_file(content) {
            Err(LoadError::Entry { index, found }) => {
                assert_eq!(index, 0);
                assert_eq!(found, "an array");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_array_root() {
        match parse_log_file(r#"{"l":"log"}"#) {
            Err(LoadError::NotAnArray { found }) => assert_eq!(found, "an object"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_reports_invalid_json() {
        assert!(matches!(parse_log_file("[{"), Err(LoadError::Json(_))));
    }

    #[test]
    fn test_parse_reports_bad_entry_index() {
        let content = r#"[{"l":"log","h":"1","d":[]}, [{"l":"log","h":"2","d":[]}, 42]]"#;
        match parse_log_file(content) {
            Err(LoadError::Entry { index, found }) => {
                assert_eq!(index, 2);
                assert_eq!(found, "a number");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_log_file("[]").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_log_file("/definitely/not/here.json").await.unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calls.json");
        std::fs::write(&path, r#"[{"l":"warn","h":"09:00","d":["slow call", 812]}]"#).unwrap();

        let entries = load_log_file(&path).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level(), LogLevel::Warn);
    }

    #[test]
    fn test_parse_keeps_entries_with_odd_field_types() {
        let content = r#"[
            {"l":"log","h":"10:00","d":["a"]},
            {"l":"log","h":1700000000,"d":["b"]},
            {"d":"plain"},
            {"l":"ERROR","h":"10:02"}
        ]"#;
        let entries = parse_log_file(content).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[1].timestamp(), "1700000000");
        assert_eq!(entries[2].data(), [json!("plain")]);
        assert_eq!(entries[3].level(), LogLevel::Error);
        assert!(entries[3].data().is_empty());
    }

    #[test]
    fn test_parse_does_not_fill_in_missing_fields() {
        let entries = parse_log_file(r#"[{"h":"1","d":[]}]"#).unwrap();
        assert_eq!(
            serde_json::to_value(&entries[0]).unwrap(),
            json!({"h": "1", "d": []})
        );
    }
}
