pub mod analyze;
pub mod import;
pub mod init;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "locacao",
    about = "Import rental-management spreadsheets (owners, tenants, properties, contracts) into SQLite."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database tables and remember the database path.
    Init {
        /// Database path or sqlite:// URL (default: $DATABASE_URL or settings)
        #[arg(long)]
        database: Option<String>,
    },
    /// Print the structure of a spreadsheet without writing anything.
    Analyze {
        /// Spreadsheet to inspect (default: docs/controle-locacao.xlsx)
        #[arg(long)]
        file: Option<String>,
    },
    /// Import owners, tenants, properties and contracts in one transaction.
    Import {
        /// Spreadsheet to import (default: docs/controle-locacao.xlsx)
        #[arg(long)]
        file: Option<String>,
        /// Database path or sqlite:// URL (default: $DATABASE_URL or settings)
        #[arg(long)]
        database: Option<String>,
    },
    /// Show row counts, placeholder owners and recent import runs.
    Status {
        /// Database path or sqlite:// URL (default: $DATABASE_URL or settings)
        #[arg(long)]
        database: Option<String>,
    },
}
