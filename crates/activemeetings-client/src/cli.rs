//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// activemeetings - Live view of the meetings running in your room
#[derive(Debug, Parser)]
#[command(name = "activemeetings")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ACTIVEMEETINGS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "compact", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Log line formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the active meetings and follow presence events
    Watch {
        /// Landing page URL
        #[arg(long)]
        page_url: Option<String>,

        /// Signed-in user id
        #[arg(long, env = "ACTIVEMEETINGS_USER")]
        user: Option<String>,

        /// Read newline-delimited JSON events from this file instead of stdin
        #[arg(long)]
        events: Option<PathBuf>,

        /// Open join URLs in the default browser
        #[arg(long)]
        open: bool,

        /// Print the final session status as JSON
        #[arg(long)]
        status: bool,
    },

    /// Ask to join a meeting
    Join {
        /// Meeting name
        meeting: String,

        /// Landing page URL
        #[arg(long)]
        page_url: Option<String>,

        /// Signed-in user id
        #[arg(long, env = "ACTIVEMEETINGS_USER")]
        user: Option<String>,

        /// Open the join URL in the default browser
        #[arg(long)]
        open: bool,
    },

    /// Record a joined meeting or the display name in the store
    Remember {
        /// Meeting to record as previously joined
        meeting: Option<String>,

        /// Display name to join with
        #[arg(long)]
        name: Option<String>,

        /// Signed-in user id
        #[arg(long, env = "ACTIVEMEETINGS_USER")]
        user: Option<String>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Show configuration and store paths
    Path,
}
