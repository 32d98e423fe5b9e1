//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

/// Declarative data extraction engine - sources in, shaped JSON out
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "HARVEST_CONFIG")]
    pub config: PathBuf,

    /// Run only the named item (may repeat)
    #[arg(short, long)]
    pub item: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "HARVEST_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "HARVEST_LOG_FORMAT")]
    pub log_format: Option<String>,
}
