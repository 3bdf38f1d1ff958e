//! Identifier generation for loans and installments.
//!
//! The engine never invents identifiers on its own; origination and the
//! interest-only roll-forward ask an [`IdGenerator`] supplied by the caller.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn loan_id(&self) -> String;

    /// Identifier for the installment at 1-based position `sequence` in the
    /// schedule of `loan_id`.
    fn installment_id(&self, loan_id: &str, sequence: usize) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn loan_id(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn installment_id(&self, _loan_id: &str, _sequence: usize) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids: `{prefix}-{n}` for loans, `{loan_id}-{sequence}` for
/// installments.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("loan")
    }
}

impl IdGenerator for SequentialIds {
    fn loan_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, n)
    }

    fn installment_id(&self, loan_id: &str, sequence: usize) -> String {
        format!("{loan_id}-{sequence}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIds::new("ln");
        assert_eq!(ids.loan_id(), "ln-1");
        assert_eq!(ids.loan_id(), "ln-2");
        assert_eq!(ids.installment_id("ln-1", 3), "ln-1-3");
    }

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids = UuidGenerator;
        assert_ne!(ids.loan_id(), ids.loan_id());
        assert_ne!(ids.installment_id("l", 1), ids.installment_id("l", 1));
    }
}
