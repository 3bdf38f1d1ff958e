//! Calendar arithmetic for due dates.
//!
//! Offsets are always taken from the start date (`start + k periods`), never
//! by stepping from the previous due date, so month-end clamping cannot
//! drift across a schedule.

use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::LedgerError;
use crate::model::Periodicity;
use crate::LedgerResult;

/// A "quincena": biweekly loans fall due every 15 days.
const BIWEEKLY_DAYS: u64 = 15;

/// Due date of the `k`-th period after `start`.
pub fn add_periods(start: NaiveDate, periodicity: Periodicity, k: u32) -> LedgerResult<NaiveDate> {
    let k64 = u64::from(k);
    let date = match periodicity {
        Periodicity::Daily => start.checked_add_days(Days::new(k64)),
        Periodicity::Weekly => start.checked_add_days(Days::new(7 * k64)),
        Periodicity::Biweekly => start.checked_add_days(Days::new(BIWEEKLY_DAYS * k64)),
        Periodicity::Monthly => start.checked_add_months(Months::new(k)),
    };
    date.ok_or_else(|| {
        LedgerError::DateError(format!(
            "{start} + {k} {periodicity:?} periods is outside the supported calendar"
        ))
    })
}

pub fn add_months(date: NaiveDate, months: u32) -> LedgerResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LedgerError::DateError(format!("{date} + {months} months overflows")))
}

/// Loan duration in weeks for `count` installments.
///
/// Uses the fixed table Daily = count/7, Weekly = count, Biweekly = count×2,
/// Monthly = count×4.
pub fn duration_weeks(periodicity: Periodicity, count: u32) -> Decimal {
    let count = Decimal::from(count);
    match periodicity {
        Periodicity::Daily => count / dec!(7),
        Periodicity::Weekly => count,
        Periodicity::Biweekly => count * dec!(2),
        Periodicity::Monthly => count * dec!(4),
    }
}

/// Duration in months, at four weeks to the month.
pub fn duration_months(periodicity: Periodicity, count: u32) -> Decimal {
    duration_weeks(periodicity, count) / dec!(4)
}
