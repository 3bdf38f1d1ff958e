//! Ledger records: borrowers, loans and their installment schedules.
//!
//! These are the shapes the storage collaborator persists. The engine reads
//! a [`Loan`] with its embedded schedule and hands back an updated copy.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

// ---------------------------------------------------------------------------
// Borrower
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BorrowerStatus {
    #[default]
    Active,
    Delinquent,
    Blocked,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// National identity document number.
    pub id_number: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: BorrowerStatus,
}

impl Borrower {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// ---------------------------------------------------------------------------
// Loan terms
// ---------------------------------------------------------------------------

/// Determines both how the schedule is generated and how payments are
/// allocated against it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanType {
    /// Principal plus flat interest spread evenly over fixed installments.
    #[default]
    Amortized,
    /// Only interest falls due each month; principal is reduced by
    /// overpayment, which rolls the schedule forward.
    InterestOnly,
    /// Like `Amortized`, but interest is charged for a whole number of months.
    FixedMonthlyInterest,
}

impl LoanType {
    /// Closed-end loans have a fixed installment count and an end date.
    pub fn is_closed_end(&self) -> bool {
        !matches!(self, LoanType::InterestOnly)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Periodicity {
    Daily,
    Weekly,
    Biweekly,
    #[default]
    Monthly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    #[default]
    Active,
    Paid,
    Delinquent,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstallmentStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
}

// ---------------------------------------------------------------------------
// Installment
// ---------------------------------------------------------------------------

/// One scheduled due amount within a loan's payment schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub id: String,
    pub loan_id: String,
    pub due_date: NaiveDate,
    /// Amount originally due.
    pub amount: Money,
    /// Accumulated across every allocation touching this installment.
    #[serde(default)]
    pub amount_paid: Money,
    /// Date of the most recent allocation.
    #[serde(default)]
    pub paid_date: Option<NaiveDate>,
    #[serde(default)]
    pub registered_by: Option<String>,
    #[serde(default)]
    pub status: InstallmentStatus,
}

impl Installment {
    pub fn new(id: String, loan_id: String, due_date: NaiveDate, amount: Money) -> Self {
        Self {
            id,
            loan_id,
            due_date,
            amount,
            amount_paid: Decimal::ZERO,
            paid_date: None,
            registered_by: None,
            status: InstallmentStatus::Pending,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// Amount still owed on this installment, never negative.
    pub fn remaining(&self) -> Money {
        (self.amount - self.amount_paid).max(Decimal::ZERO)
    }

    pub(crate) fn record_allocation(&mut self, paid_date: NaiveDate, registered_by: &str) {
        self.paid_date = Some(paid_date);
        self.registered_by = Some(registered_by.to_string());
    }
}

// ---------------------------------------------------------------------------
// Loan
// ---------------------------------------------------------------------------

/// Aggregate root. The schedule is owned by the loan and is only ever
/// written back together with the balance and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub borrower_id: String,
    pub principal: Money,
    pub monthly_rate_percent: Decimal,
    pub loan_type: LoanType,
    #[serde(default)]
    pub installment_count: Option<u32>,
    #[serde(default)]
    pub periodicity: Option<Periodicity>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub outstanding_balance: Money,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub payment_schedule: Vec<Installment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
}

impl Loan {
    pub fn installment(&self, id: &str) -> Option<&Installment> {
        self.payment_schedule.iter().find(|i| i.id == id)
    }

    pub fn all_installments_paid(&self) -> bool {
        self.payment_schedule.iter().all(Installment::is_paid)
    }

    pub fn next_unpaid(&self) -> Option<&Installment> {
        self.payment_schedule.iter().find(|i| !i.is_paid())
    }

    /// Total collected across the schedule.
    pub fn total_collected(&self) -> Money {
        self.payment_schedule.iter().map(|i| i.amount_paid).sum()
    }

    /// Loans still carrying a balance that collections should chase.
    pub fn is_open(&self) -> bool {
        matches!(self.status, LoanStatus::Active | LoanStatus::Delinquent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_installment_remaining_never_negative() {
        let mut inst = Installment::new("i-1".into(), "l-1".into(), date(2024, 2, 1), dec!(900));
        assert_eq!(inst.remaining(), dec!(900));
        inst.amount_paid = dec!(950);
        assert_eq!(inst.remaining(), Decimal::ZERO);
    }

    #[test]
    fn test_loan_deserializes_with_defaults() {
        let json = r#"{
            "id": "loan-1",
            "borrower_id": "b-1",
            "principal": "5000",
            "monthly_rate_percent": "10",
            "loan_type": "InterestOnly",
            "start_date": "2024-01-01",
            "outstanding_balance": "5000"
        }"#;
        let loan: Loan = serde_json::from_str(json).unwrap();
        assert_eq!(loan.status, LoanStatus::Active);
        assert!(loan.payment_schedule.is_empty());
        assert_eq!(loan.end_date, None);
        assert_eq!(loan.principal, dec!(5000));
    }

    #[test]
    fn test_money_serializes_as_string() {
        let inst = Installment::new("i-1".into(), "l-1".into(), date(2024, 2, 1), dec!(916.67));
        let value = serde_json::to_value(&inst).unwrap();
        assert_eq!(value["amount"], serde_json::json!("916.67"));
        assert_eq!(value["due_date"], serde_json::json!("2024-02-01"));
    }

    #[test]
    fn test_borrower_full_name() {
        let b = Borrower {
            id: "b-1".into(),
            first_name: "Ana".into(),
            last_name: "Gómez".into(),
            id_number: "1020".into(),
            phone: String::new(),
            address: String::new(),
            status: BorrowerStatus::Active,
        };
        assert_eq!(b.full_name(), "Ana Gómez");
    }
}
