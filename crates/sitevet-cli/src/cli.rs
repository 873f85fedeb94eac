//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sitevet: human-in-the-loop validation of geotagged site records
#[derive(Parser)]
#[command(name = "sitevet")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show review progress and dataset summary
    Status {
        /// Path to the dataset (CSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Review records interactively, one at a time
    Review {
        /// Path to the dataset (CSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only review records from these countries (default: all)
        #[arg(short, long)]
        country: Vec<String>,

        /// Start row index into the filtered records (inclusive)
        #[arg(long, default_value = "0")]
        start: usize,

        /// End row index into the filtered records (exclusive)
        #[arg(long, default_value = "10")]
        end: usize,

        /// Neighbor search radius in kilometers
        #[arg(long, default_value = "5.0")]
        radius: f64,

        /// URL of the shared remote copy; omit for local-only review
        #[arg(long)]
        remote: Option<String>,

        /// Branch remote writes target
        #[arg(long, default_value = "main")]
        branch: String,

        /// Bearer token for the remote store
        #[arg(long, env = "SITEVET_TOKEN")]
        token: Option<String>,
    },
}
