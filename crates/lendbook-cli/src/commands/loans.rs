use clap::Args;
use serde_json::{json, Value};
use std::time::Instant;

use lendbook_core::ids::{IdGenerator, SequentialIds, UuidGenerator};
use lendbook_core::origination::{self, LoanApplication};
use lendbook_core::{with_metadata, Loan};

use crate::input;

/// Arguments for loan origination
#[derive(Args)]
pub struct OriginateArgs {
    /// Path to JSON loan application
    #[arg(long)]
    pub input: Option<String>,

    /// Issue sequential ids `<prefix>-1`, `<prefix>-1-1`, ... instead of UUIDs
    #[arg(long)]
    pub id_prefix: Option<String>,
}

/// Arguments for loan cancellation
#[derive(Args)]
pub struct CancelArgs {
    /// Path to JSON loan document
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_originate(args: OriginateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let application: LoanApplication = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(document) = input::stdin::read_stdin()? {
        document
    } else {
        return Err("--input file or piped JSON is required for origination".into());
    };

    let ids: Box<dyn IdGenerator> = match args.id_prefix {
        Some(prefix) => Box::new(SequentialIds::new(prefix)),
        None => Box::new(UuidGenerator),
    };

    let result = origination::originate_loan(&application, ids.as_ref())?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_cancel(args: CancelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan: Loan = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(document) = input::stdin::read_stdin()? {
        document
    } else {
        return Err("--input file or piped JSON is required to cancel a loan".into());
    };

    let start = Instant::now();
    let cancelled = origination::cancel_loan(&loan)?;
    let result = with_metadata(
        "Loan cancellation: status change, schedule and balance kept",
        &json!({ "loan_id": loan.id, "status_before": loan.status }),
        Vec::new(),
        start.elapsed().as_micros() as u64,
        cancelled,
    );
    Ok(serde_json::to_value(result)?)
}
