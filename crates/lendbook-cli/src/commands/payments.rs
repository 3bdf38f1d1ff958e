use chrono::NaiveDate;
use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use lendbook_core::allocation::{self, PaymentInstruction};
use lendbook_core::ids::SequentialIds;
use lendbook_core::Loan;

use crate::input;

/// A loan and the payment to apply to it.
#[derive(Debug, Deserialize)]
pub struct PaymentDocument {
    pub loan: Loan,
    pub payment: PaymentInstruction,
}

/// Arguments for payment allocation
#[derive(Args)]
pub struct PayArgs {
    /// Path to JSON document `{ "loan": ..., "payment": ... }`
    #[arg(long)]
    pub input: Option<String>,

    /// Date used to decide whether a partial payment leaves the installment
    /// overdue (defaults to the payment date)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_pay(args: PayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut document: PaymentDocument = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(document) = input::stdin::read_stdin()? {
        document
    } else {
        return Err("--input file or piped JSON is required to apply a payment".into());
    };
    if args.as_of.is_some() {
        document.payment.as_of = args.as_of;
    }

    // appended installments are named `{loan_id}-{sequence}`
    let ids = SequentialIds::default();
    let result = allocation::apply_payment(&document.loan, &document.payment, &ids)?;
    Ok(serde_json::to_value(result)?)
}
