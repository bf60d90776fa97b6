//! Command line arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect locale catalogs, translate messages and list response codes.
#[derive(Parser, Debug)]
#[command(name = "parlance", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path; repeat to layer files, later ones winning
    #[arg(short, long, global = true)]
    pub config: Vec<PathBuf>,

    /// Environment preset used when no configuration file is given
    #[arg(short, long, global = true)]
    pub env: Option<String>,

    /// Log level or filter directive
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// What to do
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Translate one message id
    Translate {
        /// Target language, e.g. `zh-CN`
        language: String,
        /// Message id
        id: String,
        /// Template values as `key=value`; values that parse as JSON keep their type
        #[arg(short, long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,
        /// Plural count, exposed to the template as `Count`
        #[arg(long)]
        count: Option<i64>,
    },

    /// Report missing locale files and missing translations
    Check {
        /// Also apply strict configuration checks and fail on any finding
        #[arg(long)]
        strict: bool,
    },

    /// Print the response code registry
    Codes {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Warm up the service and print its statistics as JSON
    Stats,

    /// Keep the service running and reload locales when files change
    Watch,
}
