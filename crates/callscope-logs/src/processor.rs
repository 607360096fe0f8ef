use std::future::Future;

use tracing::{debug, trace};

use crate::keys::KeyGenerator;
use callscope_types::{InternalLogEntry, LogEntry};

/// Largest input processed in one go, and the size of every chunk after that
pub const CHUNK_SIZE: usize = 1000;

/// Turns parsed entries into keyed records without hogging the scheduler
#[derive(Clone, Copy, Debug, Default)]
pub struct LogProcessor {
    keys: KeyGenerator,
}

impl LogProcessor {
    /// Create a processor using the process-wide key generator
    pub fn new() -> Self {
        Self {
            keys: KeyGenerator::global(),
        }
    }

    /// Create a processor with a specific key generator
    pub fn with_keys(keys: KeyGenerator) -> Self {
        Self { keys }
    }

    /// Key every entry, in order.
    ///
    /// Inputs of up to [`CHUNK_SIZE`] entries are handled right away and come
    /// back as [`Processed::Ready`]. Larger inputs come back as a
    /// [`Processed::Chunked`] run that has to be awaited.
    pub fn process_logs(&self, entries: Vec<LogEntry>) -> Processed {
        if entries.len() <= CHUNK_SIZE {
            debug!(entries = entries.len(), "processing logs in one batch");
            return Processed::Ready(self.process_batch(entries));
        }

        let run = ChunkedRun::new(self.keys, entries);
        debug!(
            entries = run.total(),
            chunks = run.total_chunks(),
            "processing logs in chunks"
        );
        Processed::Chunked(run)
    }

    /// Key a single entry
    pub fn process_single_log(&self, entry: LogEntry) -> InternalLogEntry {
        InternalLogEntry::new(self.keys.generate_one(), entry)
    }

    fn process_batch(&self, entries: Vec<LogEntry>) -> Vec<InternalLogEntry> {
        let keys = self.keys.generate_many(entries.len());
        keys.into_iter()
            .zip(entries)
            .map(|(key, entry)| InternalLogEntry::new(key, entry))
            .collect()
    }
}

/// Result of [`LogProcessor::process_logs`]
#[must_use = "chunked results do nothing until completed"]
pub enum Processed {
    /// Small input, already keyed
    Ready(Vec<InternalLogEntry>),
    /// Large input, keyed chunk by chunk when awaited
    Chunked(ChunkedRun),
}

impl Processed {
    /// Whether the records are available without suspending
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Number of records the result will hold
    pub fn len(&self) -> usize {
        match self {
            Self::Ready(records) => records.len(),
            Self::Chunked(run) => run.total(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolve to the keyed records, yielding to the scheduler between chunks
    pub async fn complete(self) -> Vec<InternalLogEntry> {
        match self {
            Self::Ready(records) => records,
            Self::Chunked(run) => run.run().await,
        }
    }
}

/// Outcome of one [`ChunkedRun::step`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkStep {
    /// More chunks remain; the caller should yield before stepping again
    Continue,
    /// Every chunk has been processed
    Done,
}

/// Chunk-at-a-time processing state.
///
/// Each [`step`](Self::step) keys up to [`CHUNK_SIZE`] entries and appends
/// them at their input positions. Steps never suspend; suspension only
/// happens between steps in [`run_with`](Self::run_with).
pub struct ChunkedRun {
    keys: KeyGenerator,
    remaining: std::vec::IntoIter<LogEntry>,
    records: Vec<InternalLogEntry>,
    total: usize,
    chunk_index: usize,
    total_chunks: usize,
}

impl ChunkedRun {
    fn new(keys: KeyGenerator, entries: Vec<LogEntry>) -> Self {
        let total = entries.len();
        Self {
            keys,
            remaining: entries.into_iter(),
            records: Vec::with_capacity(total),
            total,
            chunk_index: 0,
            total_chunks: total.div_ceil(CHUNK_SIZE),
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    pub fn completed_chunks(&self) -> usize {
        self.chunk_index
    }

    pub fn is_done(&self) -> bool {
        self.chunk_index >= self.total_chunks
    }

    /// Process the next chunk
    pub fn step(&mut self) -> ChunkStep {
        if self.is_done() {
            return ChunkStep::Done;
        }

        let start = self.chunk_index * CHUNK_SIZE;
        debug_assert_eq!(self.records.len(), start);

        let len = self.remaining.len().min(CHUNK_SIZE);
        let keys = self.keys.generate_many(len);
        self.records.extend(
            keys.into_iter()
                .zip(self.remaining.by_ref().take(len))
                .map(|(key, entry)| InternalLogEntry::new(key, entry)),
        );

        self.chunk_index += 1;
        trace!(
            chunk = self.chunk_index,
            of = self.total_chunks,
            start,
            len,
            "processed log chunk"
        );

        if self.is_done() {
            ChunkStep::Done
        } else {
            ChunkStep::Continue
        }
    }

    /// Drive every chunk on the tokio scheduler
    pub async fn run(self) -> Vec<InternalLogEntry> {
        self.run_with(tokio::task::yield_now).await
    }

    /// Drive every chunk, awaiting `yield_now` between consecutive chunks
    pub async fn run_with<F, Fut>(mut self, mut yield_now: F) -> Vec<InternalLogEntry>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        while self.step() == ChunkStep::Continue {
            yield_now().await;
        }
        debug!(records = self.records.len(), "chunked processing finished");
        self.records
    }
}
