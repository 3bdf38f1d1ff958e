pub mod collections;
pub mod loans;
pub mod payments;
pub mod schedule;
