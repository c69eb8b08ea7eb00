use clap::Parser;
use miette::{IntoDiagnostic, Result};
use rosca::application::engine::RotationEngine;
use rosca::application::retry::retry_on_conflict;
use rosca::domain::ports::GroupStoreBox;
use rosca::infrastructure::in_memory::{InMemoryGroupStore, InMemoryPayoutLedger};
use rosca::interfaces::csv::command_reader::{Command, CommandReader};
use rosca::interfaces::csv::report_writer::ReportWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Also write every disbursed payout to this CSV file
    #[arg(long)]
    payouts: Option<PathBuf>,

    /// Attempts per command when a concurrent modification is detected
    #[arg(long, default_value_t = 3)]
    max_attempts: u32,
}

fn open_store(db_path: Option<PathBuf>) -> Result<GroupStoreBox> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = rosca::infrastructure::rocksdb::RocksDBStore::open(path)?;
            Ok(Box::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Box::new(InMemoryGroupStore::new()))
        }
        None => Ok(Box::new(InMemoryGroupStore::new())),
    }
}

async fn apply(
    engine: &RotationEngine,
    command: Command,
    max_attempts: u32,
) -> rosca::error::Result<()> {
    match command {
        Command::Create {
            members,
            contribution_amount,
        } => {
            engine.create_group(members, contribution_amount).await?;
        }
        Command::Contribute {
            group,
            member,
            amount,
        } => {
            let member = &member;
            retry_on_conflict(max_attempts, move || engine.contribute(group, member, amount))
                .await?;
        }
        Command::Advance { group } => {
            retry_on_conflict(max_attempts, move || engine.advance_round(group)).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();

    let ledger = InMemoryPayoutLedger::new();
    let engine = RotationEngine::new(open_store(cli.db_path)?, Box::new(ledger.clone()));

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (line, command) in reader.commands().enumerate() {
        match command {
            Ok(command) => {
                if let Err(e) = apply(&engine, command, cli.max_attempts).await {
                    warn!(row = line + 1, error = %e, "Command rejected");
                }
            }
            Err(e) => {
                warn!(row = line + 1, error = %e, "Error reading command");
            }
        }
    }

    let groups = engine.groups().await?;
    let stdout = io::stdout();
    ReportWriter::new(stdout.lock()).write_groups(&groups)?;

    if let Some(path) = cli.payouts {
        let file = File::create(path).into_diagnostic()?;
        ReportWriter::new(file).write_payouts(&ledger.payouts().await)?;
    }

    Ok(())
}
