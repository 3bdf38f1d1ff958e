//! Loan persistence boundary with optimistic concurrency.
//!
//! Every stored loan carries a version. A payment is a read-modify-write of
//! the whole loan, and `replace` only succeeds against the version that was
//! read, so two payments computed from the same snapshot can never both land.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::allocation::{apply_payment, PaymentInstruction, PaymentOutcome};
use crate::error::LedgerError;
use crate::ids::IdGenerator;
use crate::model::Loan;
use crate::origination::{cancel_loan, originate_loan, LoanApplication};
use crate::types::ComputationOutput;
use crate::LedgerResult;

/// A record together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

pub trait LoanStore: Send + Sync {
    /// Store a new loan at version 1.
    fn insert(&self, loan: Loan) -> LedgerResult<Versioned<Loan>>;

    fn get(&self, loan_id: &str) -> LedgerResult<Versioned<Loan>>;

    /// Swap in `loan` if the stored version still equals `expected_version`.
    fn replace(&self, loan: Loan, expected_version: u64) -> LedgerResult<Versioned<Loan>>;

    fn list(&self) -> Vec<Loan>;
}

#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    loans: RwLock<HashMap<String, Versioned<Loan>>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoanStore for InMemoryLoanStore {
    fn insert(&self, loan: Loan) -> LedgerResult<Versioned<Loan>> {
        let mut loans = self.loans.write();
        if loans.contains_key(&loan.id) {
            return Err(LedgerError::InvalidInput {
                field: "id".into(),
                reason: format!("loan {} already exists", loan.id),
            });
        }
        let record = Versioned {
            version: 1,
            value: loan,
        };
        loans.insert(record.value.id.clone(), record.clone());
        Ok(record)
    }

    fn get(&self, loan_id: &str) -> LedgerResult<Versioned<Loan>> {
        self.loans
            .read()
            .get(loan_id)
            .cloned()
            .ok_or_else(|| LedgerError::LoanNotFound(loan_id.to_string()))
    }

    fn replace(&self, loan: Loan, expected_version: u64) -> LedgerResult<Versioned<Loan>> {
        let mut loans = self.loans.write();
        let current = loans
            .get_mut(&loan.id)
            .ok_or_else(|| LedgerError::LoanNotFound(loan.id.clone()))?;
        if current.version != expected_version {
            warn!(
                loan_id = %loan.id,
                expected = expected_version,
                found = current.version,
                "stale loan write rejected"
            );
            return Err(LedgerError::ConcurrentModification {
                loan_id: loan.id,
                expected: expected_version,
                found: current.version,
            });
        }
        current.version += 1;
        current.value = loan;
        Ok(current.clone())
    }

    fn list(&self) -> Vec<Loan> {
        let mut loans: Vec<Loan> = self.loans.read().values().map(|r| r.value.clone()).collect();
        loans.sort_by(|a, b| a.id.cmp(&b.id));
        loans
    }
}

/// Engine plus store: each operation reads one loan, runs the engine on it
/// and writes the whole result back against the version it read.
pub struct Ledger<S: LoanStore, G: IdGenerator> {
    store: S,
    ids: G,
}

impl<S: LoanStore, G: IdGenerator> Ledger<S, G> {
    pub fn new(store: S, ids: G) -> Self {
        Self { store, ids }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn open_loan(&self, application: &LoanApplication) -> LedgerResult<Versioned<Loan>> {
        let loan = originate_loan(application, &self.ids)?.result;
        self.store.insert(loan)
    }

    /// Apply one payment. A [`LedgerError::ConcurrentModification`] means
    /// another payment landed first; re-read and decide whether to retry.
    pub fn record_payment(
        &self,
        loan_id: &str,
        instruction: &PaymentInstruction,
    ) -> LedgerResult<ComputationOutput<PaymentOutcome>> {
        let current = self.store.get(loan_id)?;
        let output = apply_payment(&current.value, instruction, &self.ids)?;
        let stored = self
            .store
            .replace(output.result.loan.clone(), current.version)?;
        debug!(loan_id, version = stored.version, "payment persisted");
        Ok(output)
    }

    pub fn cancel(&self, loan_id: &str) -> LedgerResult<Versioned<Loan>> {
        let current = self.store.get(loan_id)?;
        let cancelled = cancel_loan(&current.value)?;
        self.store.replace(cancelled, current.version)
    }
}
