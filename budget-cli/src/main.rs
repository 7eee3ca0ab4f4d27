//! budget-analyzer CLI - envelope budgeting in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use budget_core::LogEvent;
use commands::{demo, envelopes, import, insights, logs, settings, status, tag, tool, upload};

/// budget-analyzer - local-first envelope budgeting
#[derive(Parser)]
#[command(name = "budget", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show accounts and a summary of stored data
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Import transactions from CSV
    Import {
        #[command(subcommand)]
        command: import::ImportCommands,
    },

    /// Envelope budgets per month
    Envelopes {
        #[command(subcommand)]
        command: envelopes::EnvelopeCommands,
    },

    /// List transactions without a category
    Uncategorized {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Maximum rows to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Assign a transaction to a category
    Categorize {
        /// Transaction ID
        transaction_id: String,
        /// Category name (created if missing)
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Spending per category for a month
    Spending {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Number of categories to show
        #[arg(long)]
        top: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Daily income and expense for a month
    Trend {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Income, expense and net for a month
    Kpis {
        /// Month as YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List months that have transactions
    Months {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply tags to transactions
    Tag {
        /// Comma-separated tags to apply
        tags: String,
        /// Transaction IDs to tag
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,
        /// Replace existing tags instead of appending
        #[arg(long)]
        replace: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage CSV files stored for later import
    Upload {
        #[command(subcommand)]
        command: upload::UploadCommands,
    },

    /// Run an assistant tool with JSON arguments
    Tool {
        /// Tool name (omit to list tools)
        name: Option<String>,
        /// JSON arguments
        #[arg(long)]
        args: Option<String>,
        /// Read JSON arguments from file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show or change settings
    Settings {
        /// Default currency code for imports and budgets
        #[arg(long)]
        currency: Option<String>,
        /// Account type given to new accounts
        #[arg(long)]
        account_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete all budgeting data
    Reset {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    /// Command name for the event log
    fn name(&self) -> &'static str {
        match self {
            Commands::Status { .. } => "status",
            Commands::Import { .. } => "import",
            Commands::Envelopes { .. } => "envelopes",
            Commands::Uncategorized { .. } => "uncategorized",
            Commands::Categorize { .. } => "categorize",
            Commands::Spending { .. } => "spending",
            Commands::Trend { .. } => "trend",
            Commands::Kpis { .. } => "kpis",
            Commands::Months { .. } => "months",
            Commands::Tag { .. } => "tag",
            Commands::Upload { .. } => "upload",
            Commands::Tool { .. } => "tool",
            Commands::Settings { .. } => "settings",
            Commands::Reset { .. } => "reset",
            Commands::Demo { .. } => "demo",
            Commands::Logs { .. } => "logs",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let logger = commands::get_logger();
    let command = cli.command.name();
    commands::log_event(&logger, LogEvent::new("command_executed").with_command(command));

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_event(
                &logger,
                LogEvent::new("command_failed")
                    .with_command(command)
                    .with_error(e.to_string()),
            );
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Status { json } => status::run(json),
        Commands::Import { command } => import::run(command),
        Commands::Envelopes { command } => envelopes::run(command),
        Commands::Uncategorized { month, limit, json } => insights::uncategorized(month.as_deref(), limit, json),
        Commands::Categorize { transaction_id, category, json } => {
            envelopes::categorize(&transaction_id, &category, json)
        }
        Commands::Spending { month, top, json } => insights::spending(month.as_deref(), top, json),
        Commands::Trend { month, json } => insights::trend(month.as_deref(), json),
        Commands::Kpis { month, json } => insights::kpis(month.as_deref(), json),
        Commands::Months { json } => insights::months(json),
        Commands::Tag { tags, ids, replace, json } => tag::run(&tags, ids, replace, json),
        Commands::Upload { command } => upload::run(command),
        Commands::Tool { name, args, file } => tool::run(name.as_deref(), args.as_deref(), file.as_deref()),
        Commands::Settings { currency, account_type, json } => {
            settings::run(currency.as_deref(), account_type.as_deref(), json)
        }
        Commands::Reset { force } => settings::reset(force),
        Commands::Demo { command } => demo::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
