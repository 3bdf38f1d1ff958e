//! Payment allocation against a loan's schedule.
//!
//! Closed-end loans cascade a payment across successive unpaid installments
//! in schedule order. Interest-only loans settle the current interest
//! installment and, when the payment also reduced capital, roll the schedule
//! forward with a new installment a month later.
//!
//! The allocator works on a copy of the loan and returns it whole; the caller
//! writes the returned loan back in one operation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::calendar;
use crate::error::LedgerError;
use crate::ids::IdGenerator;
use crate::model::{Installment, InstallmentStatus, Loan, LoanStatus, LoanType};
use crate::money::{
    approx_eq, clamp_non_negative, percent_to_rate, round_money, ROLL_FORWARD_THRESHOLD,
};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::LedgerResult;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// A payment received against a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInstruction {
    /// Installment the payment was taken for. When it is unknown or already
    /// paid, the first unpaid installment is used instead.
    #[serde(default)]
    pub installment_id: String,
    pub amount_paid: Money,
    pub payment_date: NaiveDate,
    /// Who recorded the payment.
    pub registered_by: String,
    /// Calendar date treated as "today" when deciding whether a partially
    /// paid installment is overdue. Defaults to `payment_date`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub as_of: Option<NaiveDate>,
}

impl PaymentInstruction {
    fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or(self.payment_date)
    }
}

/// Which allocation rule the payment went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationBranch {
    /// Closed-end loan: spread across installments in order.
    Cascade,
    /// Interest-only loan settled in full.
    Payoff,
    /// Interest covered, capital reduced, next installment appended.
    RollForward,
    /// Less than the interest due; accumulated on the current installment.
    PartialInterest,
}

/// How much of the payment landed on one installment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentApplication {
    pub installment_id: String,
    pub applied: Money,
    pub status_after: InstallmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// The loan after the payment, to be persisted as a single update.
    pub loan: Loan,
    pub branch: AllocationBranch,
    pub applications: Vec<InstallmentApplication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appended_installment_id: Option<String>,
    /// Interest owed before the payment (interest-only loans).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_due: Option<Money>,
    /// Part of the payment left over once every installment was paid.
    pub unapplied: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Apply a payment to `loan` and return the updated loan.
///
/// `ids` supplies the identifier of any installment appended by an
/// interest-only roll-forward. `loan` itself is never modified, so an error
/// leaves nothing half-applied.
///
/// # Errors
///
/// - [`LedgerError::InvalidAmount`] when the amount is zero or negative.
/// - [`LedgerError::LoanClosed`] when the loan is Cancelled.
/// - [`LedgerError::InvalidInput`] when `registered_by` is blank.
/// - [`LedgerError::NoPendingInstallment`] when every installment is paid.
/// - [`LedgerError::InvalidLoanParameters`] when an interest-only balance
///   and rate overflow the decimal range.
/// - [`LedgerError::DateError`] when a rolled-forward due date falls outside
///   the supported calendar.
pub fn apply_payment(
    loan: &Loan,
    instruction: &PaymentInstruction,
    ids: &dyn IdGenerator,
) -> LedgerResult<ComputationOutput<PaymentOutcome>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_payment(loan, instruction)?;

    let target = resolve_target(&loan.payment_schedule, &instruction.installment_id).ok_or_else(
        || LedgerError::NoPendingInstallment {
            loan_id: loan.id.clone(),
        },
    )?;
    if loan.payment_schedule[target].id != instruction.installment_id {
        let reason = match loan.installment(&instruction.installment_id) {
            Some(_) => "already paid",
            None => "not on this loan",
        };
        debug!(
            requested = %instruction.installment_id,
            resolved = %loan.payment_schedule[target].id,
            reason,
            "requested installment not payable, using first unpaid"
        );
    }

    let outcome = match loan.loan_type {
        LoanType::InterestOnly => allocate_interest_only(loan, target, instruction, ids)?,
        LoanType::Amortized | LoanType::FixedMonthlyInterest => {
            allocate_cascading(loan, target, instruction)
        }
    };

    if outcome.unapplied > Decimal::ZERO {
        warn!(loan_id = %loan.id, unapplied = %outcome.unapplied, "payment exceeds schedule");
        warnings.push(format!(
            "{} of the payment exceeded the remaining schedule and was not applied to any installment",
            outcome.unapplied
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        methodology(outcome.branch),
        &serde_json::json!({
            "loan_id": loan.id,
            "loan_type": loan.loan_type,
            "amount_paid": instruction.amount_paid.to_string(),
            "payment_date": instruction.payment_date,
            "as_of": instruction.as_of(),
            "balance_before": loan.outstanding_balance.to_string(),
        }),
        warnings,
        elapsed,
        outcome,
    ))
}

/// Index of the installment a payment goes to: the requested one if it is
/// still unpaid, otherwise the first unpaid installment in schedule order.
pub fn resolve_target(schedule: &[Installment], installment_id: &str) -> Option<usize> {
    schedule
        .iter()
        .position(|i| i.id == installment_id && !i.is_paid())
        .or_else(|| schedule.iter().position(|i| !i.is_paid()))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_payment(loan: &Loan, instruction: &PaymentInstruction) -> LedgerResult<()> {
    if instruction.amount_paid <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(instruction.amount_paid));
    }
    if loan.status == LoanStatus::Cancelled {
        return Err(LedgerError::LoanClosed {
            loan_id: loan.id.clone(),
            status: loan.status,
        });
    }
    if instruction.registered_by.trim().is_empty() {
        return Err(LedgerError::InvalidInput {
            field: "registered_by".into(),
            reason: "a payment must record who registered it".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Closed-end loans
// ---------------------------------------------------------------------------

fn allocate_cascading(loan: &Loan, start: usize, instruction: &PaymentInstruction) -> PaymentOutcome {
    let mut updated = loan.clone();
    let as_of = instruction.as_of();
    let mut pool = instruction.amount_paid;
    let mut applications = Vec::new();

    let mut idx = start;
    while pool > Decimal::ZERO && idx < updated.payment_schedule.len() {
        let inst = &mut updated.payment_schedule[idx];
        idx += 1;
        if inst.is_paid() {
            continue;
        }

        let remaining = inst.remaining();
        let applied = if pool >= remaining {
            inst.amount_paid = inst.amount;
            inst.status = InstallmentStatus::Paid;
            remaining
        } else {
            inst.amount_paid += pool;
            inst.status = if inst.due_date < as_of {
                InstallmentStatus::Overdue
            } else {
                InstallmentStatus::Pending
            };
            pool
        };
        inst.record_allocation(instruction.payment_date, &instruction.registered_by);
        pool -= applied;

        debug!(installment = %inst.id, %applied, status = ?inst.status, "installment allocated");
        applications.push(InstallmentApplication {
            installment_id: inst.id.clone(),
            applied,
            status_after: inst.status,
        });
    }

    updated.outstanding_balance =
        clamp_non_negative(loan.outstanding_balance - instruction.amount_paid);
    if updated.all_installments_paid() {
        info!(loan_id = %loan.id, "loan fully paid");
        updated.status = LoanStatus::Paid;
    }

    PaymentOutcome {
        loan: updated,
        branch: AllocationBranch::Cascade,
        applications,
        appended_installment_id: None,
        interest_due: None,
        unapplied: pool,
    }
}

// ---------------------------------------------------------------------------
// Interest-only loans
// ---------------------------------------------------------------------------

fn allocate_interest_only(
    loan: &Loan,
    target: usize,
    instruction: &PaymentInstruction,
    ids: &dyn IdGenerator,
) -> LedgerResult<PaymentOutcome> {
    let mut updated = loan.clone();
    let rate = percent_to_rate(loan.monthly_rate_percent);
    let balance = loan.outstanding_balance;
    let interest_due = balance.checked_mul(rate).ok_or_else(|| out_of_range(loan))?;
    let payoff_amount = balance.checked_add(interest_due).ok_or_else(|| out_of_range(loan))?;
    let amount = instruction.amount_paid;

    let mut appended_installment_id = None;
    let inst = &mut updated.payment_schedule[target];
    inst.record_allocation(instruction.payment_date, &instruction.registered_by);

    let branch = if approx_eq(amount, payoff_amount) {
        inst.amount_paid += amount;
        inst.status = InstallmentStatus::Paid;
        AllocationBranch::Payoff
    } else if amount >= interest_due {
        inst.amount_paid = amount;
        inst.status = InstallmentStatus::Paid;

        let capital_paid = amount - interest_due;
        let new_balance = balance - capital_paid;
        if new_balance < ROLL_FORWARD_THRESHOLD {
            AllocationBranch::Payoff
        } else {
            let next_due = calendar::add_months(inst.due_date, 1)?;
            let sequence = updated.payment_schedule.len() + 1;
            // new_balance <= balance, so this stays within payoff_amount
            let next = Installment::new(
                ids.installment_id(&loan.id, sequence),
                loan.id.clone(),
                next_due,
                new_balance + round_money(new_balance * rate),
            );
            info!(
                loan_id = %loan.id,
                %capital_paid,
                balance = %new_balance,
                due = %next.due_date,
                "interest covered, schedule rolled forward"
            );
            appended_installment_id = Some(next.id.clone());
            updated.payment_schedule.push(next);
            updated.outstanding_balance = new_balance;
            updated.status = LoanStatus::Active;
            AllocationBranch::RollForward
        }
    } else {
        inst.amount_paid += amount;
        AllocationBranch::PartialInterest
    };

    let inst = &updated.payment_schedule[target];
    let applications = vec![InstallmentApplication {
        installment_id: inst.id.clone(),
        applied: amount,
        status_after: inst.status,
    }];

    if branch == AllocationBranch::Payoff {
        info!(loan_id = %loan.id, "interest-only loan settled");
        updated.outstanding_balance = Decimal::ZERO;
        updated.status = LoanStatus::Paid;
    }

    Ok(PaymentOutcome {
        loan: updated,
        branch,
        applications,
        appended_installment_id,
        interest_due: Some(interest_due),
        unapplied: Decimal::ZERO,
    })
}

fn out_of_range(loan: &Loan) -> LedgerError {
    LedgerError::InvalidLoanParameters(format!(
        "balance {} at {}% per month exceeds the supported decimal range",
        loan.outstanding_balance, loan.monthly_rate_percent
    ))
}

fn methodology(branch: AllocationBranch) -> &'static str {
    match branch {
        AllocationBranch::Cascade => "Cascading allocation across unpaid installments in schedule order",
        AllocationBranch::Payoff => "Interest-only payoff: balance and interest settled",
        AllocationBranch::RollForward => {
            "Interest-only payment: interest covered, capital reduced, next installment appended"
        }
        AllocationBranch::PartialInterest => "Interest-only partial payment accumulated on current installment",
    }
}
