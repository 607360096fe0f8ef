//! Log processing for callscope
//!
//! This crate provides record keys, chunked log processing, file loading,
//! storage, and view filtering.

mod filter;
pub mod format;
mod keys;
mod parser;
mod processor;
mod store;

pub use filter::ViewFilter;
pub use keys::{KeyGenerator, RandomSource};
pub use parser::{LoadError, load_log_file, parse_log_file};
pub use processor::{CHUNK_SIZE, ChunkStep, ChunkedRun, LogProcessor, Processed};
pub use store::{LevelCounts, LogStore};

// Re-export types used in our public API
pub use callscope_types::{InternalLogEntry, LevelFilter, LogEntry, LogLevel, SortOrder};
