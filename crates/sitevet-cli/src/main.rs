//! Sitevet CLI - terminal front end for the site-validation review engine.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Status { file, json } => commands::status::run(file, json),

        Commands::Review {
            file,
            country,
            start,
            end,
            radius,
            remote,
            branch,
            token,
        } => commands::review::run(file, country, start, end, radius, remote, branch, token),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
