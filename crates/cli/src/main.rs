//! Gestão de Vendas CLI - database migrations and data import.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending migrations
//! gv-cli migrate
//!
//! # Import a JSON export of the legacy in-memory data
//! gv-cli import legacy-export.json
//!
//! # Check an export without writing anything
//! gv-cli import legacy-export.json --dry-run
//! ```
//!
//! Both commands read `GESTAO_DATABASE_URL` (or `DATABASE_URL`), loading
//! `.env` first when present.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gv-cli")]
#[command(author, version, about = "Gestão de Vendas CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import reps and sales from a legacy JSON export
    Import {
        /// Path to the export (`{ "vendedores": [...], "vendas": [...] }`)
        file: PathBuf,

        /// Validate the export and report what would be imported
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Import { file, dry_run } => {
            let summary = commands::import::run(&file, dry_run).await?;
            tracing::info!(
                vendedores = summary.sales_reps,
                vendas = summary.sales,
                migrado = summary.imported,
                "Import finished"
            );
        }
    }
    Ok(())
}
