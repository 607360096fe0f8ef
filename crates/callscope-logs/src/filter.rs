use regex::Regex;

use crate::format::search_text;
use callscope_types::{InternalLogEntry, LevelFilter, SortOrder};

/// Compiled view over the records of a file: level visibility, free-text
/// search and display order
#[derive(Clone)]
pub struct ViewFilter {
    /// Regex pattern (if any)
    regex: Option<Regex>,

    /// Original pattern string
    pattern: String,

    /// Levels to include
    levels: LevelFilter,

    /// Display order
    order: SortOrder,

    /// Case sensitivity
    case_insensitive: bool,
}

impl ViewFilter {
    /// Create a new filter from a pattern string
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, false)
    }

    /// Create a case-insensitive filter
    pub fn new_case_insensitive(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, true)
    }

    /// A filter that matches any text
    pub fn without_pattern(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            ..Self::default()
        }
    }

    fn build(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = if pattern.is_empty() {
            None
        } else if case_insensitive {
            // Prepend (?i) for case insensitive matching
            Some(Regex::new(&format!("(?i){}", pattern))?)
        } else {
            Some(Regex::new(pattern)?)
        };

        Ok(Self {
            regex,
            pattern: pattern.to_string(),
            levels: LevelFilter::default(),
            order: SortOrder::default(),
            case_insensitive,
        })
    }

    /// Set visible levels
    pub fn with_levels(mut self, levels: LevelFilter) -> Self {
        self.levels = levels;
        self
    }

    /// Set display order
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    /// Check if a record passes level and search filters
    pub fn matches(&self, record: &InternalLogEntry) -> bool {
        if !self.levels.allows(&record.entry.level()) {
            return false;
        }

        match &self.regex {
            Some(re) => re.is_match(&search_text(record.entry.data())),
            None => true,
        }
    }

    /// Visible records in display order
    pub fn apply<'a>(&self, records: &'a [InternalLogEntry]) -> Vec<&'a InternalLogEntry> {
        self.visible_indices(records)
            .into_iter()
            .map(|i| &records[i])
            .collect()
    }

    /// Positions of the visible records, in display order
    pub fn visible_indices(&self, records: &[InternalLogEntry]) -> Vec<usize> {
        let mut visible: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| self.matches(r))
            .map(|(i, _)| i)
            .collect();
        if self.order == SortOrder::Desc {
            visible.reverse();
        }
        visible
    }

    /// Find all match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(re) => re
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get the original pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn levels(&self) -> LevelFilter {
        self.levels
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    /// Check if filter is empty (shows everything in file order)
    pub fn is_empty(&self) -> bool {
        self.regex.is_none() && self.levels.is_all() && self.order == SortOrder::Asc
    }

    /// Check if filter has a text pattern
    pub fn has_pattern(&self) -> bool {
        self.regex.is_some()
    }

    /// Check if filter is case insensitive
    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }
}

impl Default for ViewFilter {
    fn default() -> Self {
        Self {
            regex: None,
            pattern: String::new(),
            levels: LevelFilter::default(),
            order: SortOrder::default(),
            case_insensitive: true,
        }
    }
}

impl std::fmt::Debug for ViewFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewFilter")
            .field("pattern", &self.pattern)
            .field("levels", &self.levels)
            .field("order", &self.order)
            .field("case_insensitive", &self.case_insensitive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscope_types::{LogEntry, LogLevel};
    use serde_json::json;

    fn record(key: &str, level: LogLevel, data: serde_json::Value) -> InternalLogEntry {
        InternalLogEntry::new(key.to_string(), LogEntry::new(level, "", vec![data]))
    }

    fn sample() -> Vec<InternalLogEntry> {
        vec![
            record("1", LogLevel::Debug, json!("connecting")),
            record("2", LogLevel::Log, json!({"peer": "Alice"})),
            record("3", LogLevel::Error, json!("ICE failed")),
            record("4", LogLevel::Other("trace".into()), json!("raw frame")),
        ]
    }

    fn keys(records: &[&InternalLogEntry]) -> Vec<String> {
        records.iter().map(|r| r.key.clone()).collect()
    }

    #[test]
    fn test_empty_filter_shows_all() {
        let records = sample();
        let filter = ViewFilter::default();
        assert!(filter.is_empty());
        assert_eq!(keys(&filter.apply(&records)), ["1", "2", "3", "4"]);
    }

    #[test]
    fn test_level_filter() {
        let records = sample();
        let levels = LevelFilter::only(["error", "external"]).unwrap();
        let filter = ViewFilter::default().with_levels(levels);
        assert_eq!(keys(&filter.apply(&records)), ["3", "4"]);
    }

    #[test]
    fn test_level_slot_ignores_case() {
        let records = vec![record("1", LogLevel::Other("ERROR".into()), json!("boom"))];
        let filter = ViewFilter::default().with_levels(LevelFilter::only(["error"]).unwrap());
        assert_eq!(keys(&filter.apply(&records)), ["1"]);
    }

    #[test]
    fn test_without_pattern_keeps_case_setting() {
        let filter = ViewFilter::without_pattern(false);
        assert!(!filter.has_pattern());
        assert!(!filter.is_case_insensitive());
        assert_eq!(filter.apply(&sample()).len(), 4);
    }

    #[test]
    fn test_search_over_json_data() {
        let records = sample();
        let filter = ViewFilter::new_case_insensitive("alice").unwrap();
        assert_eq!(keys(&filter.apply(&records)), ["2"]);

        let filter = ViewFilter::new("alice").unwrap();
        assert!(filter.apply(&records).is_empty());

        // keys of structured values are searchable too
        let filter = ViewFilter::new("\"peer\"").unwrap();
        assert_eq!(keys(&filter.apply(&records)), ["2"]);
    }

    #[test]
    fn test_descending_order() {
        let records = sample();
        let filter = ViewFilter::new("i")
            .unwrap()
            .with_order(SortOrder::Desc);
        assert_eq!(keys(&filter.apply(&records)), ["3", "2", "1"]);
    }

    #[test]
    fn test_visible_indices() {
        let records = sample();
        let filter = ViewFilter::default()
            .with_levels(LevelFilter::only(["debug", "log"]).unwrap())
            .with_order(SortOrder::Desc);
        assert_eq!(filter.visible_indices(&records), vec![1, 0]);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(ViewFilter::new("(unclosed").is_err());
    }

    #[test]
    fn test_find_matches() {
        let filter = ViewFilter::new_case_insensitive("ice").unwrap();
        let matches = filter.find_matches("ICE failed, restarting ice");
        assert_eq!(matches, vec![(0, 3), (23, 26)]);
    }
}
