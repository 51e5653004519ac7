use std::path::PathBuf;

use clap::{Parser, Subcommand};
use outbox_logging::LogConfig;

#[derive(Debug, Parser)]
#[command(name = "outbox", about = "Inspect and drive an on-disk outbox event store")]
pub struct Cli {
    /// Directory holding the store documents
    #[arg(long, default_value = "./outbox-data")]
    pub dir: PathBuf,

    /// Delivery endpoint; its domain selects the namespace
    #[arg(long, default_value = "https://dc.services.visualstudio.com/v2/track")]
    pub endpoint: String,

    /// JSON store configuration file (camelCase keys)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Human-readable log lines on stderr instead of JSONL
    #[arg(long)]
    pub pretty_logs: bool,

    /// Also write JSONL logs to daily files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Logging setup requested by the global flags
    pub fn log_config(&self) -> LogConfig {
        let config = LogConfig::new(&self.log_level).with_pretty(self.pretty_logs);
        match &self.log_dir {
            Some(dir) => config.with_log_dir(dir),
            None => config,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a new event
    Add {
        /// Text payload
        #[arg(long, required_unless_present = "base64", conflicts_with = "base64")]
        data: Option<String>,
        /// Binary payload given as base64
        #[arg(long)]
        base64: Option<String>,
        /// Priority tier; lower tiers are evicted first
        #[arg(long, default_value_t = 0)]
        tier: u32,
        /// Explicit event id
        #[arg(long)]
        id: Option<String>,
    },
    /// List stored events
    List {
        /// Maximum number of events to print
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show the oldest stored event
    Next,
    /// Remove events by id
    Remove {
        /// Ids of the events to remove
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove and print every stored event
    Clear,
    /// Drop events older than the retention window
    Clean,
    /// Show namespace, limits and document size
    Info,
}
