use crate::advisor::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fintrack", version, about = "Track income and expenses, see where the money goes")]
pub struct Cli {
    /// SQLite file holding the transaction list
    #[arg(long, env = "FINTRACK_DB", default_value = "fintrack.db", global = true)]
    pub db: PathBuf,

    /// Key for the Gemini API; without it advice falls back to a notice
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "FINTRACK_MODEL", default_value = DEFAULT_MODEL, global = true)]
    pub model: String,

    #[arg(long, env = "FINTRACK_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    pub api_base: String,

    /// Write logs here instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record money coming in
    Income(EntryArgs),
    /// Record money going out
    Expense(EntryArgs),
    /// Delete a transaction by id
    Remove { id: String },
    /// Show all transactions, newest first
    List,
    /// Show totals, savings rate and allocation
    Stats,
    /// Ask the AI advisor for tips
    Advise,
    /// Interactive terminal dashboard (default)
    Dashboard,
}

#[derive(Debug, Args)]
pub struct EntryArgs {
    pub amount: String,
    pub description: String,
    /// Defaults to Salary for income and Food for expenses
    #[arg(long, short, default_value = "")]
    pub category: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_no_subcommand() {
        let cli = Cli::try_parse_from(["fintrack", "--db", "test.db"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.db, PathBuf::from("test.db"));
    }

    #[test]
    fn test_parse_expense() {
        let cli = Cli::try_parse_from(["fintrack", "expense", "12.50", "Lunch", "-c", "Food"]).unwrap();
        match cli.command {
            Some(Command::Expense(args)) => {
                assert_eq!(args.amount, "12.50");
                assert_eq!(args.description, "Lunch");
                assert_eq!(args.category, "Food");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_remove_with_global_flag_after() {
        let cli = Cli::try_parse_from(["fintrack", "remove", "abc", "--db", "x.db"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Remove { ref id }) if id == "abc"));
        assert_eq!(cli.db, PathBuf::from("x.db"));
    }

    #[test]
    fn test_income_requires_description() {
        assert!(Cli::try_parse_from(["fintrack", "income", "100"]).is_err());
    }
}
