use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::cli::Args;
use callscope_logs::{LevelFilter, SortOrder, ViewFilter};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown level '{0}' (expected debug, log, warn, error or external)")]
    UnknownLevel(String),

    #[error("invalid search pattern")]
    Pattern(#[from] regex::Error),
}

/// Contents of the TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub view: ViewConfig,
}

/// `[view]` table
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewConfig {
    pub levels: Option<Vec<String>>,
    pub sort: Option<SortOrder>,
    pub case_insensitive: Option<bool>,
    pub show_timestamps: Option<bool>,
    pub pretty: Option<bool>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// View settings after merging defaults, the config file and CLI flags
#[derive(Debug)]
pub struct Settings {
    pub view: ViewFilter,
    pub show_timestamps: bool,
    pub pretty: bool,
}

impl Settings {
    /// Load the config file named by `--config` (if any) and apply the CLI on top
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(file, args)
    }

    /// CLI flags win over the file; defaults fill the rest
    pub fn resolve(file: FileConfig, args: &Args) -> Result<Self, ConfigError> {
        let view = file.view;

        let levels = if !args.levels.is_empty() {
            LevelFilter::only(&args.levels).map_err(ConfigError::UnknownLevel)?
        } else if let Some(names) = &view.levels {
            LevelFilter::only(names).map_err(ConfigError::UnknownLevel)?
        } else {
            LevelFilter::default()
        };

        let order = if args.desc {
            SortOrder::Desc
        } else {
            view.sort.unwrap_or_default()
        };

        let case_insensitive = !args.case_sensitive && view.case_insensitive.unwrap_or(true);
        let pattern = args.search.as_deref().unwrap_or("");
        let filter = if case_insensitive {
            ViewFilter::new_case_insensitive(pattern)?
        } else {
            ViewFilter::new(pattern)?
        };

        Ok(Self {
            view: filter.with_levels(levels).with_order(order),
            show_timestamps: view.show_timestamps.unwrap_or(true),
            pretty: args.pretty || view.pretty.unwrap_or(false),
        })
    }
}
