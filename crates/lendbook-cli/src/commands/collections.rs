use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;

use lendbook_core::collections;
use lendbook_core::{with_metadata, Borrower, Loan};

use crate::input;

/// A set of loans, with their borrowers where a report needs names.
#[derive(Debug, Deserialize)]
pub struct BookDocument {
    pub loans: Vec<Loan>,
    #[serde(default)]
    pub borrowers: Vec<Borrower>,
}

/// Arguments for the overdue refresh
#[derive(Args)]
pub struct RefreshArgs {
    /// Path to JSON document `{ "loans": [...] }`
    #[arg(long)]
    pub input: Option<String>,

    /// Reference date (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the collection agenda
#[derive(Args)]
pub struct AgendaArgs {
    /// Path to JSON document `{ "loans": [...], "borrowers": [...] }`
    #[arg(long)]
    pub input: Option<String>,

    /// Collection day (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

/// Arguments for the portfolio summary
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON document `{ "loans": [...] }`
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for the payment history
#[derive(Args)]
pub struct HistoryArgs {
    /// Path to JSON document `{ "loans": [...] }`
    #[arg(long)]
    pub input: Option<String>,

    /// First payment date included
    #[arg(long)]
    pub from: NaiveDate,

    /// Last payment date included
    #[arg(long)]
    pub to: NaiveDate,
}

fn read_book(path: Option<&str>) -> Result<BookDocument, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(document) = input::stdin::read_stdin()? {
        Ok(document)
    } else {
        Err("--input file or piped JSON with a \"loans\" array is required".into())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn run_refresh_overdue(args: RefreshArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let book = read_book(args.input.as_deref())?;
    let as_of = args.as_of.unwrap_or_else(today);
    let start = Instant::now();

    let refreshed: Vec<Loan> = book
        .loans
        .iter()
        .map(|loan| collections::refresh_overdue(loan, as_of))
        .collect();
    let changed = refreshed
        .iter()
        .zip(&book.loans)
        .filter(|(after, before)| after != before)
        .count();

    let result = with_metadata(
        "Unpaid installments due before the reference date flagged overdue",
        &json!({ "as_of": as_of, "loans": book.loans.len(), "changed": changed }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        refreshed,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_agenda(args: AgendaArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let book = read_book(args.input.as_deref())?;
    let as_of = args.as_of.unwrap_or_else(today);
    let start = Instant::now();

    let mut warnings = Vec::new();
    if book.borrowers.is_empty() && !book.loans.is_empty() {
        warnings.push("no borrowers supplied; every loan was skipped".to_string());
    }
    let agenda = collections::collection_agenda(&book.loans, &book.borrowers, as_of);

    let result = with_metadata(
        "Unpaid installments of open loans due on or before the collection day, oldest first",
        &json!({ "as_of": as_of }),
        warnings,
        start.elapsed().as_micros() as u64,
        agenda,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let book = read_book(args.input.as_deref())?;
    let start = Instant::now();

    let summary = collections::portfolio_summary(&book.loans);

    let result = with_metadata(
        "Portfolio totals grouped by loan status",
        &json!({ "loans": book.loans.len() }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        summary,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_history(args: HistoryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.from > args.to {
        return Err(format!("--from {} is after --to {}", args.from, args.to).into());
    }
    let book = read_book(args.input.as_deref())?;
    let start = Instant::now();

    let history = collections::payment_history(&book.loans, args.from, args.to);

    let result = with_metadata(
        "Installments with a payment dated within the range, by payment date",
        &json!({ "from": args.from, "to": args.to }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        history,
    );
    Ok(serde_json::to_value(result)?)
}
