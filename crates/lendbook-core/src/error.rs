use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::LoanStatus;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid loan parameters: {0}")]
    InvalidLoanParameters(String),

    #[error("Invalid payment amount: {0} (must be greater than zero)")]
    InvalidAmount(Decimal),

    #[error("No pending installment left to pay on loan {loan_id}")]
    NoPendingInstallment { loan_id: String },

    #[error("Loan {loan_id} is {status:?} and cannot take payments")]
    LoanClosed { loan_id: String, status: LoanStatus },

    #[error("Loan not found: {0}")]
    LoanNotFound(String),

    #[error("Concurrent modification of loan {loan_id}: expected version {expected}, found {found}")]
    ConcurrentModification {
        loan_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::SerializationError(e.to_string())
    }
}
