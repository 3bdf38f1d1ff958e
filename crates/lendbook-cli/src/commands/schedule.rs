use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use lendbook_core::schedule::{self, ScheduleInput};
use lendbook_core::{LoanType, Periodicity};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LoanTypeArg {
    Amortized,
    InterestOnly,
    FixedMonthlyInterest,
}

impl From<LoanTypeArg> for LoanType {
    fn from(arg: LoanTypeArg) -> Self {
        match arg {
            LoanTypeArg::Amortized => LoanType::Amortized,
            LoanTypeArg::InterestOnly => LoanType::InterestOnly,
            LoanTypeArg::FixedMonthlyInterest => LoanType::FixedMonthlyInterest,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PeriodicityArg {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl From<PeriodicityArg> for Periodicity {
    fn from(arg: PeriodicityArg) -> Self {
        match arg {
            PeriodicityArg::Daily => Periodicity::Daily,
            PeriodicityArg::Weekly => Periodicity::Weekly,
            PeriodicityArg::Biweekly => Periodicity::Biweekly,
            PeriodicityArg::Monthly => Periodicity::Monthly,
        }
    }
}

/// Arguments for schedule generation
#[derive(Args)]
pub struct ScheduleArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Amount lent
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Monthly interest in percent (10 = 10% per month)
    #[arg(long, alias = "rate")]
    pub monthly_rate_percent: Option<Decimal>,

    /// Number of installments (closed-end loans)
    #[arg(long, alias = "count")]
    pub installment_count: Option<u32>,

    /// Installment frequency
    #[arg(long, value_enum)]
    pub periodicity: Option<PeriodicityArg>,

    /// Disbursement date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Loan type
    #[arg(long, value_enum, default_value = "amortized")]
    pub loan_type: LoanTypeArg,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let schedule_input: ScheduleInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(document) = input::stdin::read_stdin()? {
        document
    } else {
        ScheduleInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            monthly_rate_percent: args
                .monthly_rate_percent
                .ok_or("--monthly-rate-percent is required (or provide --input)")?,
            installment_count: args.installment_count,
            periodicity: args.periodicity.map(Periodicity::from),
            start_date: args
                .start_date
                .ok_or("--start-date is required (or provide --input)")?,
            loan_type: args.loan_type.into(),
        }
    };

    let result = schedule::generate_schedule(&schedule_input)?;
    Ok(serde_json::to_value(result)?)
}
