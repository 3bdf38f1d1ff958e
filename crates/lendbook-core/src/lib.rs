pub mod calendar;
pub mod error;
pub mod ids;
pub mod model;
pub mod money;
pub mod types;

#[cfg(feature = "schedule")]
pub mod schedule;

#[cfg(feature = "schedule")]
pub mod origination;

#[cfg(feature = "allocation")]
pub mod allocation;

#[cfg(feature = "collections")]
pub mod collections;

#[cfg(feature = "store")]
pub mod store;

pub use error::LedgerError;
pub use model::*;
pub use types::*;

/// Standard result type for all ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
