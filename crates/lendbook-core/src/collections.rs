//! Collection views over a loan book: overdue tracking, the daily agenda,
//! portfolio totals and the payment history.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::model::{Borrower, Installment, InstallmentStatus, Loan, LoanStatus};
use crate::types::Money;

/// Shown in the payment history when nobody was recorded.
const UNKNOWN_REGISTRAR: &str = "system";

// ---------------------------------------------------------------------------
// Overdue tracking
// ---------------------------------------------------------------------------

/// Status of `installment` as seen on `as_of`: unpaid and past due reads as
/// Overdue even if the stored status was never updated.
pub fn effective_status(installment: &Installment, as_of: NaiveDate) -> InstallmentStatus {
    match installment.status {
        InstallmentStatus::Pending if installment.due_date < as_of => InstallmentStatus::Overdue,
        status => status,
    }
}

/// Persist [`effective_status`] into the schedule and move the loan between
/// Active and Delinquent accordingly. Paid and Cancelled loans are returned
/// unchanged.
pub fn refresh_overdue(loan: &Loan, as_of: NaiveDate) -> Loan {
    let mut updated = loan.clone();
    if !loan.is_open() {
        return updated;
    }

    for inst in updated.payment_schedule.iter_mut() {
        inst.status = effective_status(inst, as_of);
    }
    let any_overdue = updated
        .payment_schedule
        .iter()
        .any(|i| i.status == InstallmentStatus::Overdue);

    updated.status = if any_overdue {
        LoanStatus::Delinquent
    } else {
        LoanStatus::Active
    };
    if updated.status != loan.status {
        debug!(loan_id = %loan.id, from = ?loan.status, to = ?updated.status, "loan status refreshed");
    }
    updated
}

// ---------------------------------------------------------------------------
// Agenda
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub loan_id: String,
    pub borrower_id: String,
    pub borrower_name: String,
    pub installment_id: String,
    pub due_date: NaiveDate,
    pub amount_due: Money,
    pub status: InstallmentStatus,
}

/// Installments to collect on `as_of`: everything unpaid on an open loan that
/// is due today or earlier, oldest first. Loans whose borrower is unknown are
/// skipped.
pub fn collection_agenda(loans: &[Loan], borrowers: &[Borrower], as_of: NaiveDate) -> Vec<AgendaItem> {
    let by_id: HashMap<&str, &Borrower> = borrowers.iter().map(|b| (b.id.as_str(), b)).collect();

    let mut items: Vec<AgendaItem> = loans
        .iter()
        .filter(|loan| loan.is_open())
        .filter_map(|loan| by_id.get(loan.borrower_id.as_str()).map(|b| (loan, *b)))
        .flat_map(|(loan, borrower)| {
            loan.payment_schedule
                .iter()
                .filter(move |inst| !inst.is_paid() && inst.due_date <= as_of)
                .map(move |inst| AgendaItem {
                    loan_id: loan.id.clone(),
                    borrower_id: borrower.id.clone(),
                    borrower_name: borrower.full_name(),
                    installment_id: inst.id.clone(),
                    due_date: inst.due_date,
                    amount_due: inst.remaining(),
                    status: effective_status(inst, as_of),
                })
        })
        .collect();

    items.sort_by(|a, b| a.due_date.cmp(&b.due_date));
    items
}

// ---------------------------------------------------------------------------
// Portfolio summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusBucket {
    pub count: usize,
    pub total_principal: Money,
    pub total_outstanding: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub loan_count: usize,
    pub total_lent: Money,
    /// Outstanding balance of Active and Delinquent loans.
    pub open_outstanding: Money,
    pub total_collected: Money,
    pub by_status: BTreeMap<String, StatusBucket>,
}

pub fn portfolio_summary(loans: &[Loan]) -> PortfolioSummary {
    let mut by_status: BTreeMap<String, StatusBucket> = BTreeMap::new();
    let mut total_lent = Decimal::ZERO;
    let mut open_outstanding = Decimal::ZERO;
    let mut total_collected = Decimal::ZERO;

    for loan in loans {
        total_lent += loan.principal;
        total_collected += loan.total_collected();
        if loan.is_open() {
            open_outstanding += loan.outstanding_balance;
        }

        let bucket = by_status.entry(format!("{:?}", loan.status)).or_default();
        bucket.count += 1;
        bucket.total_principal += loan.principal;
        bucket.total_outstanding += loan.outstanding_balance;
    }

    PortfolioSummary {
        loan_count: loans.len(),
        total_lent,
        open_outstanding,
        total_collected,
        by_status,
    }
}

// ---------------------------------------------------------------------------
// Payment history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub loan_id: String,
    pub borrower_id: String,
    pub installment_id: String,
    pub paid_date: NaiveDate,
    pub amount_paid: Money,
    pub registered_by: String,
}

/// Installments that received money with a last payment date in
/// `[from, to]`, ordered by payment date.
pub fn payment_history(loans: &[Loan], from: NaiveDate, to: NaiveDate) -> Vec<PaymentRecord> {
    let mut records: Vec<PaymentRecord> = loans
        .iter()
        .flat_map(|loan| {
            loan.payment_schedule.iter().filter_map(move |inst| {
                let paid_date = inst.paid_date?;
                if inst.amount_paid <= Decimal::ZERO || paid_date < from || paid_date > to {
                    return None;
                }
                Some(PaymentRecord {
                    loan_id: loan.id.clone(),
                    borrower_id: loan.borrower_id.clone(),
                    installment_id: inst.id.clone(),
                    paid_date,
                    amount_paid: inst.amount_paid,
                    registered_by: inst
                        .registered_by
                        .clone()
                        .unwrap_or_else(|| UNKNOWN_REGISTRAR.to_string()),
                })
            })
        })
        .collect();

    records.sort_by(|a, b| a.paid_date.cmp(&b.paid_date));
    records
}
