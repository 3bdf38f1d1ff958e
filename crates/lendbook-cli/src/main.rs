mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::collections::{AgendaArgs, HistoryArgs, PortfolioArgs, RefreshArgs};
use commands::loans::{CancelArgs, OriginateArgs};
use commands::payments::PayArgs;
use commands::schedule::ScheduleArgs;

/// Micro-lending loan book calculations
#[derive(Parser)]
#[command(
    name = "lendbook",
    version,
    about = "Loan schedules, payment allocation and collection reports",
    long_about = "A CLI for running a micro-lending loan book with decimal precision. \
                  Generates installment schedules, originates loans, applies payments \
                  to schedules, and reports on overdue installments, the portfolio \
                  and payment history. Documents are read as JSON from --input or stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine decisions to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an installment schedule from loan terms
    Schedule(ScheduleArgs),
    /// Open a loan: schedule plus identifiers and starting balance
    Originate(OriginateArgs),
    /// Cancel a loan
    Cancel(CancelArgs),
    /// Apply a payment to a loan
    Pay(PayArgs),
    /// Flag past-due installments and mark loans delinquent
    RefreshOverdue(RefreshArgs),
    /// Installments to collect on a given day
    Agenda(AgendaArgs),
    /// Portfolio totals grouped by loan status
    Portfolio(PortfolioArgs),
    /// Payments received within a date range
    History(HistoryArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lendbook_core=debug,lendbook_cli=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the JSON document
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Originate(args) => commands::loans::run_originate(args),
        Commands::Cancel(args) => commands::loans::run_cancel(args),
        Commands::Pay(args) => commands::payments::run_pay(args),
        Commands::RefreshOverdue(args) => commands::collections::run_refresh_overdue(args),
        Commands::Agenda(args) => commands::collections::run_agenda(args),
        Commands::Portfolio(args) => commands::collections::run_portfolio(args),
        Commands::History(args) => commands::collections::run_history(args),
        Commands::Version => {
            println!("lendbook {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
