//! Turning an approved application into a persisted-shape [`Loan`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use crate::error::LedgerError;
use crate::ids::IdGenerator;
use crate::model::{Installment, Loan, LoanStatus, LoanType, Periodicity};
use crate::schedule::{generate_schedule, ScheduleInput};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LedgerResult;

/// Everything needed to open a loan for a borrower.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    pub borrower_id: String,
    pub principal: Money,
    pub monthly_rate_percent: Decimal,
    #[serde(default)]
    pub loan_type: LoanType,
    #[serde(default)]
    pub installment_count: Option<u32>,
    #[serde(default)]
    pub periodicity: Option<Periodicity>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub fund_source: Option<String>,
    #[serde(default)]
    pub observations: Option<String>,
    /// Initial status, Active unless the lender says otherwise.
    #[serde(default)]
    pub status: Option<LoanStatus>,
}

impl LoanApplication {
    pub fn schedule_input(&self) -> ScheduleInput {
        ScheduleInput {
            principal: self.principal,
            monthly_rate_percent: self.monthly_rate_percent,
            installment_count: self.installment_count,
            periodicity: self.periodicity,
            start_date: self.start_date,
            loan_type: self.loan_type,
        }
    }
}

/// Generate the schedule and assemble a new loan with fresh identifiers.
///
/// Interest-only loans start owing the principal; closed-end loans start
/// owing the full schedule total. Terms that generate no schedule are
/// refused here, since such a loan must never be stored.
pub fn originate_loan(
    application: &LoanApplication,
    ids: &dyn IdGenerator,
) -> LedgerResult<ComputationOutput<Loan>> {
    let start = Instant::now();

    if application.borrower_id.trim().is_empty() {
        return Err(LedgerError::InvalidInput {
            field: "borrower_id".into(),
            reason: "a loan must belong to a borrower".into(),
        });
    }

    let generated = generate_schedule(&application.schedule_input())?;
    if generated.result.is_empty() {
        return Err(LedgerError::InvalidLoanParameters(
            generated
                .warnings
                .first()
                .cloned()
                .unwrap_or_else(|| "no schedule generated".into()),
        ));
    }
    let warnings = generated.warnings;
    let terms = generated.result;

    let loan_id = ids.loan_id();
    let payment_schedule = terms
        .schedule
        .iter()
        .map(|s| {
            Installment::new(
                ids.installment_id(&loan_id, s.number as usize),
                loan_id.clone(),
                s.due_date,
                s.amount,
            )
        })
        .collect();

    let outstanding_balance = match application.loan_type {
        LoanType::InterestOnly => application.principal,
        LoanType::Amortized | LoanType::FixedMonthlyInterest => terms.total_amount,
    };
    let closed_end = application.loan_type.is_closed_end();

    let loan = Loan {
        id: loan_id,
        borrower_id: application.borrower_id.clone(),
        principal: application.principal,
        monthly_rate_percent: application.monthly_rate_percent,
        loan_type: application.loan_type,
        installment_count: application.installment_count.filter(|_| closed_end),
        periodicity: application.periodicity.filter(|_| closed_end),
        start_date: application.start_date,
        end_date: terms.end_date,
        outstanding_balance,
        status: application.status.unwrap_or_default(),
        payment_schedule,
        fund_source: application.fund_source.clone(),
        observations: application.observations.clone(),
    };

    info!(
        loan_id = %loan.id,
        borrower_id = %loan.borrower_id,
        loan_type = ?loan.loan_type,
        balance = %loan.outstanding_balance,
        "loan originated"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Loan origination from generated schedule",
        &serde_json::json!({
            "borrower_id": application.borrower_id,
            "principal": application.principal.to_string(),
            "total_amount": terms.total_amount.to_string(),
            "installment_amount": terms.installment_amount.to_string(),
        }),
        warnings,
        elapsed,
        loan,
    ))
}

/// Cancel a loan. Cancellation is a status change; nothing is removed.
pub fn cancel_loan(loan: &Loan) -> LedgerResult<Loan> {
    if loan.status == LoanStatus::Paid {
        return Err(LedgerError::InvalidInput {
            field: "status".into(),
            reason: format!("loan {} is already paid and cannot be cancelled", loan.id),
        });
    }
    let mut cancelled = loan.clone();
    cancelled.status = LoanStatus::Cancelled;
    info!(loan_id = %loan.id, "loan cancelled");
    Ok(cancelled)
}
