mod analyzer;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod normalize;
mod settings;
mod workbook;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let result: anyhow::Result<()> = match cli.command {
        Commands::Init { database } => cli::init::run(database).map_err(Into::into),
        Commands::Analyze { file } => cli::analyze::run(file).map_err(Into::into),
        Commands::Import { file, database } => {
            cli::import::run(file, database).context("import aborted; all changes rolled back")
        }
        Commands::Status { database } => cli::status::run(database).map_err(Into::into),
    };

    if let Err(e) = result {
        eprintln!("{} {e:?}", "Error:".red().bold());
        std::process::exit(1);
    }
}
