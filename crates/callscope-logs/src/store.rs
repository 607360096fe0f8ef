use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use callscope_types::{InternalLogEntry, LogLevel};

/// Thread-safe holder for the records of the currently open file
#[derive(Clone, Default)]
pub struct LogStore {
    /// Internal storage
    inner: Arc<RwLock<StoreInner>>,

    /// Most recently started load
    generation: Arc<AtomicU64>,
}

#[derive(Default)]
struct StoreInner {
    records: Vec<InternalLogEntry>,
    source: Option<String>,
    loaded_generation: u64,
}

impl LogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load and return its generation.
    ///
    /// Any load started earlier becomes stale: its results are dropped by
    /// [`finish_load`](Self::finish_load).
    pub fn begin_load(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether a started load has not delivered its records yet
    pub fn is_loading(&self) -> bool {
        self.inner.read().loaded_generation != self.generation.load(Ordering::SeqCst)
    }

    /// Install the records of a finished load.
    ///
    /// Returns false and keeps the current records if a newer load was
    /// started in the meantime.
    pub fn finish_load(
        &self,
        generation: u64,
        source: impl Into<String>,
        records: Vec<InternalLogEntry>,
    ) -> bool {
        if generation != self.generation.load(Ordering::SeqCst) {
            warn!(generation, "discarding records from a stale load");
            return false;
        }

        let mut inner = self.inner.write();
        debug!(generation, records = records.len(), "installed log records");
        inner.records = records;
        inner.source = Some(source.into());
        inner.loaded_generation = generation;
        true
    }

    /// Generation of the records currently installed (0 before the first load)
    pub fn loaded_generation(&self) -> u64 {
        self.inner.read().loaded_generation
    }

    /// Mark a load as finished without records (for example after a parse error).
    ///
    /// Returns false if a newer load was started, in which case the failure
    /// no longer concerns the user.
    pub fn abandon_load(&self, generation: u64) -> bool {
        if generation != self.generation.load(Ordering::SeqCst) {
            debug!(generation, "ignoring failure of a stale load");
            return false;
        }
        self.inner.write().loaded_generation = generation;
        true
    }

    /// Read access to the current records
    pub fn with_records<R>(&self, f: impl FnOnce(&[InternalLogEntry]) -> R) -> R {
        f(&self.inner.read().records)
    }

    /// Get all records (cloned)
    pub fn all(&self) -> Vec<InternalLogEntry> {
        self.inner.read().records.clone()
    }

    /// Name of the file the current records came from
    pub fn source(&self) -> Option<String> {
        self.inner.read().source.clone()
    }

    /// Get record count per log level
    pub fn level_counts(&self) -> LevelCounts {
        let inner = self.inner.read();
        let mut counts = LevelCounts::default();

        for record in inner.records.iter() {
            match record.entry.level() {
                LogLevel::Debug => counts.debug += 1,
                LogLevel::Log => counts.log += 1,
                LogLevel::Warn => counts.warn += 1,
                LogLevel::Error => counts.error += 1,
                LogLevel::Other(_) => counts.external += 1,
            }
        }

        counts
    }

    /// Total record count
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Drop all records and the source name
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.records.clear();
        inner.source = None;
    }
}

/// Counts per log level
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub debug: usize,
    pub log: usize,
    pub warn: usize,
    pub error: usize,
    pub external: usize,
}

impl LevelCounts {
    pub fn total(&self) -> usize {
        self.debug + self.log + self.warn + self.error + self.external
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callscope_types::LogEntry;

    fn record(key: &str, level: LogLevel) -> InternalLogEntry {
        InternalLogEntry::new(key.to_string(), LogEntry::new(level, "", Vec::new()))
    }

    #[test]
    fn test_finish_load_installs_records() {
        let store = LogStore::new();
        let generation = store.begin_load();
        assert!(store.is_loading());

        assert!(store.finish_load(generation, "calls.json", vec![record("a", LogLevel::Log)]));
        assert!(!store.is_loading());
        assert_eq!(store.len(), 1);
        assert_eq!(store.source().as_deref(), Some("calls.json"));
    }

    #[test]
    fn test_last_load_wins() {
        let store = LogStore::new();
        let first = store.begin_load();
        let second = store.begin_load();

        assert!(store.finish_load(second, "new.json", vec![record("new", LogLevel::Log)]));
        assert!(!store.finish_load(first, "old.json", vec![record("old", LogLevel::Log)]));

        assert_eq!(store.all()[0].key, "new");
        assert_eq!(store.source().as_deref(), Some("new.json"));
    }

    #[test]
    fn test_abandon_load() {
        let store = LogStore::new();
        let generation = store.begin_load();
        assert!(store.abandon_load(generation));
        assert!(!store.is_loading());
        assert!(store.is_empty());
    }

    #[test]
    fn test_abandon_stale_load() {
        let store = LogStore::new();
        let first = store.begin_load();
        let second = store.begin_load();

        assert!(!store.abandon_load(first));
        assert!(store.is_loading());
        assert!(store.finish_load(second, "new.json", vec![record("new", LogLevel::Log)]));
    }

    #[test]
    fn test_level_counts() {
        let store = LogStore::new();
        let generation = store.begin_load();
        store.finish_load(
            generation,
            "calls.json",
            vec![
                record("1", LogLevel::Debug),
                record("2", LogLevel::Error),
                record("3", LogLevel::Error),
                record("4", LogLevel::Other("info".to_string())),
            ],
        );

        let counts = store.level_counts();
        assert_eq!(counts.debug, 1);
        assert_eq!(counts.error, 2);
        assert_eq!(counts.external, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_clear() {
        let store = LogStore::new();
        let generation = store.begin_load();
        store.finish_load(generation, "calls.json", vec![record("a", LogLevel::Log)]);
        store.clear();
        assert!(store.is_empty());
        assert!(store.source().is_none());
    }
}
