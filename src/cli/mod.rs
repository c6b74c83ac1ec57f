pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gazette")]
#[command(about = "Collects recent channel posts into a single HTML digest", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/gazette/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect recent posts and render the digest
    Collect {
        /// Write the page here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How far back to read (e.g., "24h", "30m", "2d")
        #[arg(short, long)]
        window: Option<String>,

        /// File with one channel handle per line
        #[arg(long)]
        channels: Option<PathBuf>,

        /// Dump every fetched raw message as JSON into this directory
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
    /// Resolve a handle and print the channel it names
    Resolve {
        /// Public channel handle
        handle: String,
    },
}
