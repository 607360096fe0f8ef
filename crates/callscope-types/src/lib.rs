//! Shared types for callscope
//!
//! This crate contains data structures used across multiple callscope crates.

use std::borrow::Cow;

use ratatui::style::Color;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level as written by the call logger.
///
/// The logger only emits the four known levels, but the viewer never rejects
/// an entry: anything else is carried through as [`LogLevel::Other`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    Debug,
    Log,
    Warn,
    Error,
    Other(String),
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<&str> for LogLevel {
    /// Classification ignores case; an unrecognized level keeps its spelling
    fn from(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Self::Debug,
            "log" => Self::Log,
            "warn" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        match Self::from(s.as_str()) {
            Self::Other(_) => Self::Other(s),
            known => known,
        }
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl LogLevel {
    /// Canonical name of a known level, or the original text of any other
    pub fn as_str(&self) -> &str {
        match self {
            Self::Debug => "debug",
            Self::Log => "log",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }

    /// Short display tag (3 chars)
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Debug => "DBG",
            Self::Log => "LOG",
            Self::Warn => "WRN",
            Self::Error => "ERR",
            Self::Other(_) => "EXT",
        }
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Debug => Color::Cyan,
            Self::Log => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
            Self::Other(_) => Color::Magenta,
        }
    }

    /// Whether this is one of the four levels the logger emits
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// A single log entry as stored in a call-log file.
///
/// Field names are fixed by the file format: `l` (level), `h` (timestamp)
/// and `d` (data). Fields are kept exactly as read, whatever their JSON
/// type, and absent fields stay absent when written back. The accessors
/// interpret them for display and filtering.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(
        rename = "l",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    level: Option<Value>,

    #[serde(
        rename = "h",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    timestamp: Option<Value>,

    #[serde(
        rename = "d",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    data: Option<Value>,
}

/// Keep an explicit `null` as a value instead of folding it into "absent"
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl LogEntry {
    pub fn new(level: LogLevel, timestamp: impl Into<String>, data: Vec<Value>) -> Self {
        Self {
            level: Some(Value::String(level.as_str().to_string())),
            timestamp: Some(Value::String(timestamp.into())),
            data: Some(Value::Array(data)),
        }
    }

    /// Level class of `l`. Missing means [`LogLevel::default`]; a non-string
    /// value is carried as its compact JSON in [`LogLevel::Other`].
    pub fn level(&self) -> LogLevel {
        match &self.level {
            Some(Value::String(s)) => LogLevel::from(s.as_str()),
            Some(other) => LogLevel::Other(other.to_string()),
            None => LogLevel::default(),
        }
    }

    /// Timestamp as written by the logger (opaque, never parsed).
    /// Non-string values are shown as compact JSON.
    pub fn timestamp(&self) -> Cow<'_, str> {
        match &self.timestamp {
            Some(Value::String(s)) => Cow::Borrowed(s),
            Some(other) => Cow::Owned(other.to_string()),
            None => Cow::Borrowed(""),
        }
    }

    /// Logged values, in call order. A `d` that is not an array counts as a
    /// single value.
    pub fn data(&self) -> &[Value] {
        match &self.data {
            Some(Value::Array(values)) => values,
            Some(other) => std::slice::from_ref(other),
            None => &[],
        }
    }
}

/// A log entry paired with its render identity.
///
/// The key is generated once when the entry is processed and never derived
/// from the entry's content, so two identical lines still get distinct keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InternalLogEntry {
    pub key: String,

    #[serde(flatten)]
    pub entry: LogEntry,
}

impl InternalLogEntry {
    pub fn new(key: String, entry: LogEntry) -> Self {
        Self { key, entry }
    }
}

// ============================================================================
// View Types
// ============================================================================

/// Which levels are visible in the viewer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelFilter {
    pub debug: bool,
    pub log: bool,
    pub warning: bool,
    pub error: bool,
    /// Entries whose level is not one of the four known levels
    pub external: bool,
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self {
            debug: true,
            log: true,
            warning: true,
            error: true,
            external: true,
        }
    }
}

impl LevelFilter {
    /// A filter with every level hidden
    pub fn none() -> Self {
        Self {
            debug: false,
            log: false,
            warning: false,
            error: false,
            external: false,
        }
    }

    /// Build a filter showing only the named levels.
    ///
    /// Accepts the wire names plus `warning` and `external`. Returns the first
    /// unrecognized name as the error.
    pub fn only<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::none();
        for name in names {
            let slot = match name.as_ref().to_lowercase().as_str() {
                "debug" => &mut filter.debug,
                "log" => &mut filter.log,
                "warn" | "warning" => &mut filter.warning,
                "error" => &mut filter.error,
                "external" => &mut filter.external,
                _ => return Err(name.as_ref().to_string()),
            };
            *slot = true;
        }
        Ok(filter)
    }

    fn slot_mut(&mut self, level: &LogLevel) -> &mut bool {
        match level {
            LogLevel::Debug => &mut self.debug,
            LogLevel::Log => &mut self.log,
            LogLevel::Warn => &mut self.warning,
            LogLevel::Error => &mut self.error,
            LogLevel::Other(_) => &mut self.external,
        }
    }

    /// Check whether entries of this level are visible
    pub fn allows(&self, level: &LogLevel) -> bool {
        match level {
            LogLevel::Debug => self.debug,
            LogLevel::Log => self.log,
            LogLevel::Warn => self.warning,
            LogLevel::Error => self.error,
            LogLevel::Other(_) => self.external,
        }
    }

    /// Flip visibility for the slot this level belongs to
    pub fn toggle(&mut self, level: &LogLevel) {
        let slot = self.slot_mut(level);
        *slot = !*slot;
    }

    /// True when nothing is hidden
    pub fn is_all(&self) -> bool {
        *self == Self::default()
    }
}

/// Display order of the log list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// File order
    #[default]
    Asc,
    /// Reverse file order
    Desc,
}

impl SortOrder {
    pub fn toggle(&self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}
