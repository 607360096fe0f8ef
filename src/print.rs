use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Settings;
use callscope_logs::format::{data_to_pretty, data_to_text};
use callscope_logs::{InternalLogEntry, LogProcessor, ViewFilter, load_log_file};

/// Load a file and write its visible records to stdout
pub async fn run(path: &Path, settings: &Settings) -> Result<()> {
    let entries = load_log_file(path)
        .await
        .with_context(|| format!("Failed to load {}", path.display()))?;
    let records = LogProcessor::new().process_logs(entries).complete().await;

    let mut out = BufWriter::new(io::stdout().lock());
    let written = write_records(&mut out, &records, &settings.view, settings.pretty)?;
    out.flush()?;

    debug!(total = records.len(), written, "printed records");
    Ok(())
}

/// Write one block per visible record, returning how many were written.
///
/// Compact form is `<h> <LEVEL> <data>`; pretty form puts the data on the
/// following lines, indented.
pub fn write_records<W: Write>(
    out: &mut W,
    records: &[InternalLogEntry],
    view: &ViewFilter,
    pretty: bool,
) -> io::Result<usize> {
    let visible = view.apply(records);
    for record in &visible {
        let entry = &record.entry;
        let level = entry.level().as_str().to_uppercase();

        if pretty {
            writeln!(out, "{} {}", entry.timestamp(), level)?;
            for line in data_to_pretty(entry.data()).lines() {
                writeln!(out, "  {}", line)?;
            }
        } else {
            writeln!(
                out,
                "{} {} {}",
                entry.timestamp(),
                level,
                data_to_text(entry.data())
            )?;
        }
    }
    Ok(visible.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscope_logs::{LogEntry, LogLevel, SortOrder};
    use serde_json::json;

    fn records() -> Vec<InternalLogEntry> {
        vec![
            InternalLogEntry::new(
                "a".to_string(),
                LogEntry::new(LogLevel::Log, "10:00", vec![json!("offer"), json!(1)]),
            ),
            InternalLogEntry::new(
                "b".to_string(),
                LogEntry::new(LogLevel::Error, "10:01", vec![json!({"x": 1})]),
            ),
        ]
    }

    fn render(view: &ViewFilter, pretty: bool) -> (usize, String) {
        let mut out = Vec::new();
        let written = write_records(&mut out, &records(), view, pretty).unwrap();
        (written, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_compact_lines() {
        let (written, text) = render(&ViewFilter::default(), false);
        assert_eq!(written, 2);
        assert_eq!(text, "10:00 LOG offer 1\n10:01 ERROR {\"x\":1}\n");
    }

    #[test]
    fn test_pretty_blocks() {
        let view = ViewFilter::new_case_insensitive("\"x\"").unwrap();
        let (written, text) = render(&view, true);
        assert_eq!(written, 1);
        assert_eq!(text, "10:01 ERROR\n  {\n    \"x\": 1\n  }\n");
    }

    #[test]
    fn test_desc_order() {
        let view = ViewFilter::default().with_order(SortOrder::Desc);
        let (_, text) = render(&view, false);
        assert!(text.starts_with("10:01"));
    }
}
