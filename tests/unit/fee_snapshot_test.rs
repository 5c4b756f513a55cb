use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use feegov::core::money;
use feegov::payments::models::{Payment, PaymentStatus};
use feegov::snapshots::{FeeMode, FeeSnapshotRecorder};

/// Property-based tests for the fee snapshot computation
///
/// Validates:
/// - fee_amount = round_half_up(base × pct / 100, 2)
/// - additive totals add the fee, deductive totals keep the base
/// - amounts always carry exactly 2 decimal places
/// - the fee never exceeds the base for pct ≤ 100

fn payment(amount: Decimal) -> Payment {
    let now = Utc::now();
    Payment {
        id: Uuid::new_v4(),
        school_id: Uuid::new_v4(),
        fee_assignment_id: Uuid::new_v4(),
        transaction_reference: "TXN-PROP".to_string(),
        amount,
        status: PaymentStatus::Pending,
        payment_method: "mpesa".to_string(),
        installment_number: None,
        payment_date: None,
        gateway_response: None,
        created_at: now,
        updated_at: now,
    }
}

fn cents(value: u64) -> Decimal {
    Decimal::new(value as i64, 2)
}

#[test]
fn test_reference_example() {
    let recorder = FeeSnapshotRecorder::new(dec!(2.5), FeeMode::Additive);
    let snapshot = recorder.snapshot_for(&payment(dec!(1000.00)), None, Utc::now());

    assert_eq!(snapshot.fee_amount, dec!(25.00));
    assert_eq!(snapshot.total_amount, dec!(1025.00));
    assert_eq!(snapshot.fee_amount.to_string(), "25.00");
}

proptest! {
    #[test]
    fn test_fee_matches_half_up_formula(
        base_cents in 1u64..100_000_000u64,
        pct_hundredths in 0u64..=10_000u64
    ) {
        let base = cents(base_cents);
        let pct = cents(pct_hundredths);
        let recorder = FeeSnapshotRecorder::new(pct, FeeMode::Additive);

        let (fee, total) = recorder.compute(base, pct);

        let exact = base * pct / Decimal::ONE_HUNDRED;
        prop_assert!((fee - exact).abs() <= dec!(0.005), "fee {} too far from {}", fee, exact);
        prop_assert_eq!(fee, money::round_money(exact));
        prop_assert_eq!(fee.scale(), 2);
        prop_assert_eq!(total, base + fee);
    }

    #[test]
    fn test_fee_bounded_by_base(
        base_cents in 1u64..100_000_000u64,
        pct_hundredths in 0u64..=10_000u64
    ) {
        let base = cents(base_cents);
        let recorder = FeeSnapshotRecorder::new(dec!(2.5), FeeMode::Additive);
        let (fee, _) = recorder.compute(base, cents(pct_hundredths));

        prop_assert!(fee >= Decimal::ZERO);
        prop_assert!(fee <= base);
    }

    #[test]
    fn test_deductive_total_is_base(
        base_cents in 1u64..100_000_000u64,
        pct_hundredths in 0u64..=10_000u64
    ) {
        let base = cents(base_cents);
        let recorder = FeeSnapshotRecorder::new(dec!(2.5), FeeMode::Deductive);
        let (_, total) = recorder.compute(base, cents(pct_hundredths));

        prop_assert_eq!(total, base);
    }

    #[test]
    fn test_snapshot_uses_default_without_rate(base_cents in 1u64..10_000_000u64) {
        let recorder = FeeSnapshotRecorder::new(dec!(2.5), FeeMode::Additive);
        let snapshot = recorder.snapshot_for(&payment(cents(base_cents)), None, Utc::now());

        prop_assert_eq!(snapshot.fee_percentage, dec!(2.5));
        prop_assert!(snapshot.fee_rate_id.is_none());
        prop_assert_eq!(snapshot.total_amount, snapshot.base_amount + snapshot.fee_amount);
    }
}
