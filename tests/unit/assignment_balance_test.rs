use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use feegov::payments::models::{AssignmentStatus, StudentFeeAssignment};

/// Property-based tests for the fee assignment balance rule
///
/// Validates:
/// - paid_amount never decreases
/// - status is fully_paid exactly when paid_amount >= total_due
/// - fully_paid never reverts to active

fn assignment(total_due: Decimal) -> StudentFeeAssignment {
    let now = Utc::now();
    StudentFeeAssignment {
        id: Uuid::new_v4(),
        school_id: Uuid::new_v4(),
        student_id: Uuid::new_v4(),
        payment_plan_id: None,
        total_due,
        paid_amount: Decimal::ZERO,
        status: AssignmentStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    #[test]
    fn test_credits_are_monotone_and_status_tracks_balance(
        total_cents in 1i64..10_000_000i64,
        credits in prop::collection::vec(1i64..5_000_000i64, 1..12)
    ) {
        let total_due = Decimal::new(total_cents, 2);
        let mut a = assignment(total_due);
        let mut was_fully_paid = false;

        for credit in credits {
            let before = a.paid_amount;
            a.credit(Decimal::new(credit, 2), Utc::now()).unwrap();

            prop_assert!(a.paid_amount > before);
            prop_assert_eq!(a.paid_amount, before + Decimal::new(credit, 2));
            prop_assert_eq!(
                a.status == AssignmentStatus::FullyPaid,
                a.paid_amount >= total_due
            );

            if was_fully_paid {
                prop_assert_eq!(a.status, AssignmentStatus::FullyPaid);
            }
            was_fully_paid = a.status == AssignmentStatus::FullyPaid;
        }
    }

    #[test]
    fn test_rejected_credit_leaves_balance_untouched(
        total_cents in 1i64..10_000_000i64,
        bad in -1_000_000i64..=0i64
    ) {
        let mut a = assignment(Decimal::new(total_cents, 2));
        prop_assert!(a.credit(Decimal::new(bad, 2), Utc::now()).is_err());
        prop_assert_eq!(a.paid_amount, Decimal::ZERO);
        prop_assert_eq!(a.status, AssignmentStatus::Active);
    }
}
