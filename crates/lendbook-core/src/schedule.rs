//! Schedule generation for new loans.
//!
//! Closed-end loans (Amortized, FixedMonthlyInterest) charge flat interest on
//! the full principal, publish an installment floored to a round multiple of
//! 100 and let the final installment absorb whatever the flooring left over,
//! so the schedule always sums to the total exactly. Interest-only loans get
//! a single installment a month out and roll forward as they are paid.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::calendar;
use crate::model::{InstallmentStatus, LoanType, Periodicity};
use crate::money::{checked_flat_interest, floor_to_unit, percent_to_rate, ROUNDING_UNIT};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LedgerResult;

// ---------------------------------------------------------------------------
// Input / Output Types
// ---------------------------------------------------------------------------

/// Loan terms the schedule is generated from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleInput {
    pub principal: Money,
    /// Monthly interest in percent (10 = 10% per month).
    pub monthly_rate_percent: Decimal,
    /// Required for closed-end loan types, ignored for InterestOnly.
    #[serde(default)]
    pub installment_count: Option<u32>,
    /// Defaults to Monthly. Ignored for InterestOnly.
    #[serde(default)]
    pub periodicity: Option<Periodicity>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub loan_type: LoanType,
}

/// One generated entry, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    /// 1-based position in the schedule.
    pub number: u32,
    pub due_date: NaiveDate,
    pub amount: Money,
    pub status: InstallmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutput {
    /// Principal plus interest over the life of the loan (first period only
    /// for InterestOnly).
    pub total_amount: Money,
    pub total_interest: Money,
    /// Published installment figure. The last closed-end installment may
    /// differ from it.
    pub installment_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub schedule: Vec<ScheduledInstallment>,
}

impl ScheduleOutput {
    fn empty() -> Self {
        Self {
            total_amount: Decimal::ZERO,
            total_interest: Decimal::ZERO,
            installment_amount: Decimal::ZERO,
            end_date: None,
            schedule: Vec::new(),
        }
    }

    /// `true` when the inputs were unusable and nothing was generated.
    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Generate the payment schedule for a new loan.
///
/// Unusable terms (non-positive principal, a closed-end loan without at
/// least one installment, totals beyond the decimal range) do not fail: the
/// output is an empty schedule with zero totals and a warning, and the caller
/// must not persist it. The only error is a due date falling outside the
/// supported calendar, which is checked before any installment is built.
pub fn generate_schedule(
    input: &ScheduleInput,
) -> LedgerResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let rate = percent_to_rate(input.monthly_rate_percent);
    let periodicity = input.periodicity.unwrap_or_default();

    let priced = match invalid_terms(input) {
        Some(reason) => Err(reason),
        None => flat_interest(input, rate, periodicity),
    };

    let output = match priced {
        Err(reason) => {
            warn!(%reason, "loan parameters unusable, returning empty schedule");
            warnings.push(format!("Invalid loan parameters: {reason}; no schedule generated"));
            ScheduleOutput::empty()
        }
        Ok(total_interest) => match input.loan_type {
            LoanType::InterestOnly => {
                interest_only_schedule(input.principal, total_interest, input.start_date)?
            }
            LoanType::Amortized | LoanType::FixedMonthlyInterest => {
                // validated above
                let count = input.installment_count.unwrap_or(1);
                let out = closed_end_schedule(
                    input.principal,
                    total_interest,
                    count,
                    periodicity,
                    input.start_date,
                )?;
                if out.installment_amount.is_zero() && count > 1 {
                    warnings.push(format!(
                        "Installment below {ROUNDING_UNIT}; the final installment carries the full total"
                    ));
                }
                out
            }
        },
    };

    debug!(
        loan_type = ?input.loan_type,
        installments = output.schedule.len(),
        total = %output.total_amount,
        "schedule generated"
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Flat-rate schedule, installments floored to 100 with remainder in the final installment",
        &serde_json::json!({
            "loan_type": input.loan_type,
            "principal": input.principal.to_string(),
            "monthly_rate": rate.to_string(),
            "installment_count": input.installment_count,
            "periodicity": periodicity,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

fn invalid_terms(input: &ScheduleInput) -> Option<String> {
    if input.principal <= Decimal::ZERO {
        return Some(format!("principal must be positive, got {}", input.principal));
    }
    if input.monthly_rate_percent < Decimal::ZERO {
        return Some(format!(
            "monthly rate cannot be negative, got {}",
            input.monthly_rate_percent
        ));
    }
    if input.loan_type.is_closed_end() && input.installment_count.unwrap_or(0) < 1 {
        return Some("at least one installment is required".into());
    }
    None
}

/// Interest charged on the full principal over the life of the loan, one
/// month of it for InterestOnly.
fn flat_interest(
    input: &ScheduleInput,
    rate: Rate,
    periodicity: Periodicity,
) -> Result<Money, String> {
    let months = match input.loan_type {
        LoanType::InterestOnly => Decimal::ONE,
        LoanType::Amortized | LoanType::FixedMonthlyInterest => interest_months(
            input.loan_type,
            periodicity,
            input.installment_count.unwrap_or(1),
        ),
    };
    checked_flat_interest(input.principal, rate, months).ok_or_else(|| {
        format!(
            "principal {} at {}% per month exceeds the supported decimal range",
            input.principal, input.monthly_rate_percent
        )
    })
}

/// Months of interest charged on the full principal.
fn interest_months(loan_type: LoanType, periodicity: Periodicity, count: u32) -> Decimal {
    let months = calendar::duration_months(periodicity, count);
    match loan_type {
        LoanType::FixedMonthlyInterest => months.floor().max(Decimal::ONE),
        _ => months,
    }
}

fn closed_end_schedule(
    principal: Money,
    total_interest: Money,
    count: u32,
    periodicity: Periodicity,
    start_date: NaiveDate,
) -> LedgerResult<ScheduleOutput> {
    // the last due date bounds every earlier one
    let end_date = calendar::add_periods(start_date, periodicity, count)?;
    let total_amount = principal + total_interest;
    let installment_amount = floor_to_unit(total_amount / Decimal::from(count));

    let mut schedule = Vec::with_capacity(count as usize);
    let mut remaining_total = total_amount;
    for number in 1..=count {
        let amount = if number == count {
            remaining_total
        } else {
            remaining_total -= installment_amount;
            installment_amount
        };
        schedule.push(ScheduledInstallment {
            number,
            due_date: calendar::add_periods(start_date, periodicity, number)?,
            amount,
            status: InstallmentStatus::Pending,
        });
    }

    Ok(ScheduleOutput {
        total_amount,
        total_interest,
        installment_amount,
        end_date: Some(end_date),
        schedule,
    })
}

fn interest_only_schedule(
    principal: Money,
    total_interest: Money,
    start_date: NaiveDate,
) -> LedgerResult<ScheduleOutput> {
    let amount = principal + total_interest;
    Ok(ScheduleOutput {
        total_amount: amount,
        total_interest,
        installment_amount: amount,
        end_date: None,
        schedule: vec![ScheduledInstallment {
            number: 1,
            due_date: calendar::add_months(start_date, 1)?,
            amount,
            status: InstallmentStatus::Pending,
        }],
    })
}
