use chrono::{Months, NaiveDate};
use lendbook_core::schedule::{generate_schedule, ScheduleInput};
use lendbook_core::{InstallmentStatus, LoanType, Money, Periodicity};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn input(loan_type: LoanType, count: u32, periodicity: Periodicity) -> ScheduleInput {
    ScheduleInput {
        principal: dec!(5000),
        monthly_rate_percent: dec!(10),
        installment_count: Some(count),
        periodicity: Some(periodicity),
        start_date: date(2024, 1, 1),
        loan_type,
    }
}

// ===========================================================================
// Amortized
// ===========================================================================

#[test]
fn test_reference_amortized_schedule() {
    let out = generate_schedule(&input(LoanType::Amortized, 12, Periodicity::Monthly))
        .unwrap()
        .result;

    let due: Vec<NaiveDate> = out.schedule.iter().map(|i| i.due_date).collect();
    let expected: Vec<NaiveDate> = (1..=12u32)
        .map(|k| date(2024, 1, 1) + Months::new(k))
        .collect();
    assert_eq!(due, expected);

    let amounts: Vec<Money> = out.schedule.iter().map(|i| i.amount).collect();
    let mut expected_amounts = vec![dec!(900); 11];
    expected_amounts.push(dec!(1100));
    assert_eq!(amounts, expected_amounts);

    assert_eq!(out.total_amount, dec!(11000));
    assert_eq!(out.end_date, Some(date(2025, 1, 1)));
}

#[test]
fn test_daily_amortized_interest_is_fractional() {
    // 14 days = 2 weeks = half a month
    let out = generate_schedule(&input(LoanType::Amortized, 14, Periodicity::Daily))
        .unwrap()
        .result;

    assert_eq!(out.total_interest, dec!(250));
    assert_eq!(out.total_amount, dec!(5250));
    // 5250 / 14 = 375, floored to 300
    assert_eq!(out.installment_amount, dec!(300));
    assert_eq!(out.schedule[13].amount, dec!(5250) - dec!(300) * dec!(13));
    assert_eq!(out.end_date, Some(date(2024, 1, 15)));
}

#[test]
fn test_remainder_sits_only_in_last_installment() {
    let out = generate_schedule(&input(LoanType::Amortized, 7, Periodicity::Weekly))
        .unwrap()
        .result;

    let sum: Money = out.schedule.iter().map(|i| i.amount).sum();
    assert_eq!(sum, out.total_amount);
    let irregular: Vec<u32> = out
        .schedule
        .iter()
        .filter(|i| i.amount != out.installment_amount)
        .map(|i| i.number)
        .collect();
    assert_eq!(irregular, vec![7]);
}

// ===========================================================================
// Fixed monthly interest
// ===========================================================================

#[test]
fn test_fixed_monthly_interest_matches_amortized_on_whole_months() {
    let amortized = generate_schedule(&input(LoanType::Amortized, 6, Periodicity::Monthly))
        .unwrap()
        .result;
    let fixed = generate_schedule(&input(LoanType::FixedMonthlyInterest, 6, Periodicity::Monthly))
        .unwrap()
        .result;

    assert_eq!(amortized.schedule, fixed.schedule);
    assert_eq!(fixed.total_amount, dec!(8000));
}

#[test]
fn test_fixed_monthly_interest_biweekly_floors_months() {
    // 5 quincenas = 10 weeks = 2.5 months, charged as 2
    let out = generate_schedule(&input(LoanType::FixedMonthlyInterest, 5, Periodicity::Biweekly))
        .unwrap()
        .result;

    assert_eq!(out.total_interest, dec!(1000));
    assert_eq!(out.total_amount, dec!(6000));
    assert_eq!(out.installment_amount, dec!(1200));
    assert_eq!(out.schedule[4].amount, dec!(1200));
    assert_eq!(out.end_date, Some(date(2024, 3, 16)));
}

// ===========================================================================
// Interest only
// ===========================================================================

#[test]
fn test_interest_only_ignores_count_and_periodicity() {
    let out = generate_schedule(&input(LoanType::InterestOnly, 24, Periodicity::Daily))
        .unwrap()
        .result;

    assert_eq!(out.schedule.len(), 1);
    assert_eq!(out.schedule[0].due_date, date(2024, 2, 1));
    assert_eq!(out.schedule[0].amount, dec!(5500));
    assert_eq!(out.schedule[0].status, InstallmentStatus::Pending);
    assert_eq!(out.end_date, None);
}

#[test]
fn test_zero_rate_interest_only() {
    let mut i = input(LoanType::InterestOnly, 1, Periodicity::Monthly);
    i.monthly_rate_percent = Decimal::ZERO;
    let out = generate_schedule(&i).unwrap().result;
    assert_eq!(out.schedule[0].amount, dec!(5000));
}

// ===========================================================================
// Degraded input
// ===========================================================================

#[test]
fn test_negative_principal_yields_empty_output() {
    let mut i = input(LoanType::Amortized, 12, Periodicity::Monthly);
    i.principal = dec!(-1);
    let output = generate_schedule(&i).unwrap();

    assert!(output.result.schedule.is_empty());
    assert_eq!(output.result.total_amount, Decimal::ZERO);
    assert!(output.warnings[0].contains("principal"));
}

#[test]
fn test_input_from_json_defaults_to_monthly() {
    let i: ScheduleInput = serde_json::from_str(
        r#"{
            "principal": "5000",
            "monthly_rate_percent": "10",
            "installment_count": 12,
            "start_date": "2024-01-01",
            "loan_type": "Amortized"
        }"#,
    )
    .unwrap();
    let out = generate_schedule(&i).unwrap().result;
    assert_eq!(out.total_amount, dec!(11000));
    assert_eq!(out.schedule[0].due_date, date(2024, 2, 1));
}
