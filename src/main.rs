use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

use catering::import::{import_clients, import_cooks};
use catering::logging::init_logging;
use catering::{recompute_classification, run_scan, setup_database, total_payable, Config};

/// Catering backend command line
#[derive(Parser)]
#[command(name = "catering", version, about)]
struct Cli {
    /// Database file (defaults to CATERING_DB_PATH, then catering.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register clients or cooks from a CSV file with first_name,last_name
    Import {
        #[command(subcommand)]
        kind: ImportKind,
    },
    /// Run the cook report once and print qualifying cooks
    Report,
    /// Print a client's total payable
    Bill { client_id: i64 },
    /// Recompute and print a client's classification
    Classify { client_id: i64 },
}

#[derive(Subcommand)]
enum ImportKind {
    Clients { csv: PathBuf },
    Cooks { csv: PathBuf },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => Config::load()?.db_path,
    };

    let mut conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    setup_database(&conn)?;

    match cli.command {
        Command::Import { kind } => {
            let (label, count) = match kind {
                ImportKind::Clients { csv } => ("clients", import_clients(&mut conn, &csv)?),
                ImportKind::Cooks { csv } => ("cooks", import_cooks(&mut conn, &csv)?),
            };
            println!("✓ Imported {count} {label}");
        }
        Command::Report => {
            let db = Mutex::new(conn);
            let cooks = run_scan(&db);
            if cooks.is_empty() {
                println!("No cook prepares a main course among several dishes");
            }
            for cook in cooks {
                println!("{} {} (#{})", cook.first_name, cook.last_name, cook.id);
            }
        }
        Command::Bill { client_id } => {
            let total = total_payable(&mut conn, client_id)?;
            println!("{total:.2}");
        }
        Command::Classify { client_id } => {
            let tier = recompute_classification(&mut conn, client_id)?;
            println!("{tier}");
        }
    }

    Ok(())
}
