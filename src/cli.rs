use std::path::PathBuf;

use clap::Parser;

/// Callscope - A terminal UI for browsing structured call-log files
#[derive(Parser, Debug, Default)]
#[command(name = "callscope")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Call-log file to open (a JSON array of log entries)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Read view defaults from a TOML file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the visible records to stdout instead of opening the viewer
    #[arg(long)]
    pub print: bool,

    /// Show only these levels (debug, log, warn, error, external); repeatable
    #[arg(long = "level", value_name = "LEVEL")]
    pub levels: Vec<String>,

    /// Initial search pattern (regex)
    #[arg(long, value_name = "PATTERN")]
    pub search: Option<String>,

    /// Match the search pattern case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Newest entries first
    #[arg(long)]
    pub desc: bool,

    /// Print data pretty-printed (with --print)
    #[arg(long)]
    pub pretty: bool,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
