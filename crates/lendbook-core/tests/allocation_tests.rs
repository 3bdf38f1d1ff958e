use chrono::NaiveDate;
use lendbook_core::allocation::{apply_payment, AllocationBranch, PaymentInstruction};
use lendbook_core::ids::SequentialIds;
use lendbook_core::origination::{originate_loan, LoanApplication};
use lendbook_core::{InstallmentStatus, LedgerError, Loan, LoanStatus, LoanType, Money, Periodicity};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn open(loan_type: LoanType) -> Loan {
    let application = LoanApplication {
        borrower_id: "b-1".into(),
        principal: dec!(5000),
        monthly_rate_percent: dec!(10),
        loan_type,
        installment_count: Some(12),
        periodicity: Some(Periodicity::Monthly),
        start_date: date(2024, 1, 1),
        fund_source: None,
        observations: None,
        status: None,
    };
    originate_loan(&application, &SequentialIds::new("ln"))
        .unwrap()
        .result
}

fn payment(installment_id: &str, amount: Money, on: NaiveDate) -> PaymentInstruction {
    PaymentInstruction {
        installment_id: installment_id.into(),
        amount_paid: amount,
        payment_date: on,
        registered_by: "cashier@example.com".into(),
        as_of: None,
    }
}

// ===========================================================================
// Amortized loans end to end
// ===========================================================================

#[test]
fn test_paying_every_installment_on_time_settles_loan() {
    let ids = SequentialIds::new("ln");
    let mut loan = open(LoanType::Amortized);

    for k in 0..12 {
        let inst = loan.payment_schedule[k].clone();
        loan = apply_payment(&loan, &payment(&inst.id, inst.amount, inst.due_date), &ids)
            .unwrap()
            .result
            .loan;
        let expected = if k == 11 { LoanStatus::Paid } else { LoanStatus::Active };
        assert_eq!(loan.status, expected, "after installment {}", k + 1);
    }

    assert_eq!(loan.outstanding_balance, Decimal::ZERO);
    assert_eq!(loan.total_collected(), dec!(11000));
    assert!(loan
        .payment_schedule
        .iter()
        .all(|i| i.status == InstallmentStatus::Paid && i.paid_date == Some(i.due_date)));
}

#[test]
fn test_large_payment_spans_three_installments() {
    let loan = open(LoanType::Amortized);
    let out = apply_payment(
        &loan,
        &payment("ln-1-1", dec!(2000), date(2024, 2, 1)),
        &SequentialIds::default(),
    )
    .unwrap()
    .result;

    let paid: Vec<Money> = out.loan.payment_schedule[..4].iter().map(|i| i.amount_paid).collect();
    assert_eq!(paid, vec![dec!(900), dec!(900), dec!(200), dec!(0)]);
    let statuses: Vec<InstallmentStatus> = out.loan.payment_schedule[..3]
        .iter()
        .map(|i| i.status)
        .collect();
    assert_eq!(
        statuses,
        vec![InstallmentStatus::Paid, InstallmentStatus::Paid, InstallmentStatus::Pending]
    );
    assert_eq!(out.loan.outstanding_balance, dec!(9000));
    assert_eq!(out.branch, AllocationBranch::Cascade);
}

#[test]
fn test_late_partial_payment_flags_overdue() {
    let loan = open(LoanType::FixedMonthlyInterest);
    let mut instruction = payment("ln-1-1", dec!(100), date(2024, 3, 5));
    instruction.as_of = Some(date(2024, 3, 5));
    let out = apply_payment(&loan, &instruction, &SequentialIds::default())
        .unwrap()
        .result;

    let first = &out.loan.payment_schedule[0];
    assert_eq!(first.status, InstallmentStatus::Overdue);
    assert_eq!(first.paid_date, Some(date(2024, 3, 5)));
}

#[test]
fn test_final_installment_absorbs_remainder_when_paid() {
    let ids = SequentialIds::default();
    let loan = open(LoanType::Amortized);
    // everything but the final installment
    let loan = apply_payment(&loan, &payment("ln-1-1", dec!(9900), date(2024, 2, 1)), &ids)
        .unwrap()
        .result
        .loan;
    assert_eq!(loan.outstanding_balance, dec!(1100));
    assert_eq!(loan.status, LoanStatus::Active);

    let out = apply_payment(&loan, &payment("ln-1-12", dec!(1100), date(2025, 1, 1)), &ids)
        .unwrap()
        .result;
    assert_eq!(out.loan.status, LoanStatus::Paid);
    assert_eq!(out.loan.payment_schedule[11].amount_paid, dec!(1100));
}

// ===========================================================================
// Interest-only loans end to end
// ===========================================================================

#[test]
fn test_interest_only_rolls_month_by_month_then_settles() {
    let ids = SequentialIds::new("ln");
    let mut loan = open(LoanType::InterestOnly);

    for month in 0..3 {
        let due = loan.next_unpaid().unwrap().clone();
        let out = apply_payment(&loan, &payment(&due.id, dec!(500), due.due_date), &ids)
            .unwrap()
            .result;
        assert_eq!(out.branch, AllocationBranch::RollForward);
        loan = out.loan;
        assert_eq!(loan.payment_schedule.len(), month + 2);
        assert_eq!(loan.outstanding_balance, dec!(5000));
    }
    let due_dates: Vec<NaiveDate> = loan.payment_schedule.iter().map(|i| i.due_date).collect();
    assert_eq!(
        due_dates,
        vec![date(2024, 2, 1), date(2024, 3, 1), date(2024, 4, 1), date(2024, 5, 1)]
    );

    let due = loan.next_unpaid().unwrap().clone();
    let out = apply_payment(&loan, &payment(&due.id, dec!(5500), due.due_date), &ids)
        .unwrap()
        .result;
    assert_eq!(out.branch, AllocationBranch::Payoff);
    assert_eq!(out.loan.status, LoanStatus::Paid);
    assert_eq!(out.loan.outstanding_balance, Decimal::ZERO);
    assert_eq!(out.loan.payment_schedule.len(), 4);

    let err = apply_payment(&out.loan, &payment(&due.id, dec!(1), due.due_date), &ids).unwrap_err();
    assert!(matches!(err, LedgerError::NoPendingInstallment { .. }));
}

#[test]
fn test_interest_only_interest_recomputed_on_reduced_balance() {
    let ids = SequentialIds::new("ln");
    let loan = open(LoanType::InterestOnly);
    let loan = apply_payment(&loan, &payment("ln-1-1", dec!(2500), date(2024, 2, 1)), &ids)
        .unwrap()
        .result
        .loan;
    assert_eq!(loan.outstanding_balance, dec!(3000));

    let out = apply_payment(&loan, &payment("ln-1-2", dec!(300), date(2024, 3, 1)), &ids)
        .unwrap()
        .result;
    assert_eq!(out.interest_due, Some(dec!(300)));
    assert_eq!(out.branch, AllocationBranch::RollForward);
    assert_eq!(out.loan.payment_schedule[2].amount, dec!(3300));
}

// ===========================================================================
// Properties
// ===========================================================================

fn amount_strategy() -> impl Strategy<Value = Money> {
    (1i64..600_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_closed_end_balance_never_negative_and_cascade_in_order(
        amounts in prop::collection::vec(amount_strategy(), 1..30),
        fixed in any::<bool>(),
    ) {
        let ids = SequentialIds::default();
        let mut loan = open(if fixed { LoanType::FixedMonthlyInterest } else { LoanType::Amortized });
        let original_balance = loan.outstanding_balance;
        let mut paid_in = Decimal::ZERO;

        for amount in amounts {
            let target = loan.payment_schedule[0].id.clone();
            let out = match apply_payment(&loan, &payment(&target, amount, date(2024, 2, 1)), &ids) {
                Ok(out) => out.result,
                Err(LedgerError::NoPendingInstallment { .. }) => {
                    prop_assert_eq!(loan.status, LoanStatus::Paid);
                    break;
                }
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            };
            loan = out.loan;
            paid_in += amount;

            prop_assert!(loan.outstanding_balance >= Decimal::ZERO);
            prop_assert_eq!(
                loan.outstanding_balance,
                (original_balance - paid_in).max(Decimal::ZERO)
            );

            // Paid* then at most one partial, then untouched
            let first_unpaid = loan.payment_schedule.iter().position(|i| !i.is_paid());
            if let Some(f) = first_unpaid {
                prop_assert!(loan.payment_schedule[..f].iter().all(|i| i.is_paid()));
                prop_assert!(loan.payment_schedule[f + 1..]
                    .iter()
                    .all(|i| i.amount_paid.is_zero() && !i.is_paid()));
            } else {
                prop_assert_eq!(loan.status, LoanStatus::Paid);
            }

            let applied: Money = out.applications.iter().map(|a| a.applied).sum();
            prop_assert_eq!(applied + out.unapplied, amount);
        }
    }

    #[test]
    fn prop_interest_only_balance_never_negative(
        amounts in prop::collection::vec(amount_strategy(), 1..30),
    ) {
        let ids = SequentialIds::default();
        let mut loan = open(LoanType::InterestOnly);

        for amount in amounts {
            let target = match loan.next_unpaid() {
                Some(inst) => inst.id.clone(),
                None => break,
            };
            let out = apply_payment(&loan, &payment(&target, amount, date(2024, 2, 1)), &ids)
                .map_err(|e| TestCaseError::fail(e.to_string()))?
                .result;
            let before = loan.outstanding_balance;
            loan = out.loan;

            prop_assert!(loan.outstanding_balance >= Decimal::ZERO);
            prop_assert!(loan.outstanding_balance <= before);
            if loan.status == LoanStatus::Paid {
                prop_assert!(loan.outstanding_balance.is_zero());
                prop_assert!(loan.next_unpaid().is_none());
            } else {
                prop_assert_eq!(
                    loan.payment_schedule.iter().filter(|i| !i.is_paid()).count(),
                    1
                );
            }
        }
    }
}
