use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "procvisor", version, about = "Keeps configured worker processes running")]
pub struct Cli {
    /// Log filter (e.g. "info", "procvisor=debug"); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch and supervise the configured workers until stopped
    Run {
        /// Path to the configuration file
        #[arg(short, long, default_value = "procvisor.toml")]
        config: PathBuf,
    },
    /// Load the configuration and show what would be launched
    Check {
        /// Path to the configuration file
        #[arg(short, long, default_value = "procvisor.toml")]
        config: PathBuf,
    },
}
