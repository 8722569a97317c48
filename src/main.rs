mod advisor;
mod config;
mod db;
mod error;
mod models;
mod operations;
mod store;

use advisor::AdvisoryClient;
use advisor::gemini::GeminiClient;
use clap::Parser;
use config::{Cli, Command, EntryArgs};
use db::slot::{DEFAULT_SLOT_KEY, SqliteSlot};
use models::transaction::TransactionType;
use operations::add::add_transaction;
use operations::advise::{generate_insights, parse_tips};
use operations::dashboard::run_dashboard;
use operations::remove::remove_transaction;
use operations::report::{format_currency, summary_lines};
use operations::stats::derive_stats;
use std::fs::File;
use std::process;
use std::sync::{Arc, Mutex};
use store::RecordStore;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error setting up logging: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging(cli: &Cli) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match cli.log_file {
        Some(ref path) => {
            let file = File::create(path)
                .map_err(|e| format!("Failed to create log file '{}': {}", path.display(), e))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), String> {
    let conn = db::connection::establish_connection(&cli.db)
        .map_err(|e| format!("Failed to open database '{}': {}", cli.db.display(), e))?;
    let mut store = RecordStore::load(SqliteSlot::new(conn, DEFAULT_SLOT_KEY));

    match cli.command.unwrap_or(Command::Dashboard) {
        Command::Income(args) => add(&mut store, TransactionType::Income, args),
        Command::Expense(args) => add(&mut store, TransactionType::Expense, args),
        Command::Remove { id } => {
            if remove_transaction(&mut store, &id)? {
                println!("Transaction removed successfully.");
            } else {
                println!("No transaction with ID {}.", id.trim());
            }
            Ok(())
        }
        Command::List => {
            if store.is_empty() {
                println!("No transactions yet.");
            }
            for t in store.transactions() {
                println!(
                    "{}  {}  {:<7}  {:>12}  {:<13}  {}",
                    t.id,
                    t.date.format("%Y-%m-%d %H:%M"),
                    t.transaction_type.as_str(),
                    format_currency(t.amount),
                    t.category,
                    t.description
                );
            }
            Ok(())
        }
        Command::Stats => {
            for line in summary_lines(&derive_stats(store.transactions())) {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Advise => {
            let client = GeminiClient::new(cli.api_key, &cli.model, &cli.api_base)
                .map_err(|e| format!("Failed to set up advisor: {}", e))?;
            match generate_insights(&client, store.transactions()) {
                None => println!("Add at least one transaction to get insights."),
                Some(text) => {
                    for tip in parse_tips(&text) {
                        println!("- {}", tip);
                    }
                }
            }
            Ok(())
        }
        Command::Dashboard => {
            let client: Arc<dyn AdvisoryClient> = Arc::new(
                GeminiClient::new(cli.api_key, &cli.model, &cli.api_base)
                    .map_err(|e| format!("Failed to set up advisor: {}", e))?,
            );
            run_dashboard(&mut store, client)
        }
    }
}

fn add(store: &mut RecordStore<SqliteSlot>, transaction_type: TransactionType, args: EntryArgs) -> Result<(), String> {
    let transaction = add_transaction(store, transaction_type, &args.amount, &args.description, &args.category)?;
    println!(
        "Added {} {} ({}) with ID {}",
        transaction.transaction_type.as_str(),
        format_currency(transaction.amount),
        transaction.category,
        transaction.id
    );
    Ok(())
}
