//! Postgres store tests
//!
//! These exercise the SQL implementations against a real database and are
//! ignored by default. Run with:
//!   TEST_DATABASE_URL=postgres://... cargo test --test postgres_store_test -- --ignored

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use uuid::Uuid;

use feegov::app::Stores;
use feegov::core::AppError;
use feegov::fee_rates::FeeRateStatus;
use feegov::middleware::{auth::hash_token, IdentityResolver, PgIdentityResolver, Role};
use feegov::payments::{AssignmentStatus, CallbackPayload, PaymentStatus, StudentFeeAssignment};
use feegov::snapshots::{FeeMode, FeeSnapshotRepository, PgFeeSnapshotRepository};
use feegov::AppServices;

struct PgFixture {
    pool: PgPool,
    services: AppServices,
    school_id: Uuid,
    proposer: feegov::middleware::Actor,
    approver: feegov::middleware::Actor,
    admin: feegov::middleware::Actor,
}

async fn pg_fixture() -> PgFixture {
    let pool = create_test_pool().await;
    let school_id = insert_school(&pool, "verified").await;

    PgFixture {
        services: AppServices::new(
            Stores::postgres(&pool),
            &fee_config(FeeMode::Additive),
            &gateway_config(None),
        ),
        proposer: insert_profile(&pool, Role::SchoolStaff, Some(school_id)).await,
        approver: insert_profile(&pool, Role::SchoolAdmin, Some(school_id)).await,
        admin: insert_profile(&pool, Role::SuperAdmin, None).await,
        school_id,
        pool,
    }
}

impl PgFixture {
    async fn activate_rate(&self, percentage: Decimal) -> Uuid {
        let rates = &self.services.fee_rates;
        let rate = rates
            .propose(&self.proposer, Some(self.school_id), percentage)
            .await
            .unwrap();
        rates.school_approve(&self.approver, rate.id).await.unwrap();
        rates.admin_approve(&self.admin, rate.id).await.unwrap();
        rate.id
    }

    /// Assignment plus one pending payment; returns (assignment_id, reference)
    async fn seed_payment(&self, total_due: Decimal, amount: Decimal) -> (Uuid, String) {
        let assignment_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO student_fee_assignments (id, school_id, student_id, total_due) VALUES ($1, $2, $3, $4)",
        )
        .bind(assignment_id)
        .bind(self.school_id)
        .bind(Uuid::new_v4())
        .bind(total_due)
        .execute(&self.pool)
        .await
        .unwrap();

        let reference = self.add_payment(assignment_id, amount).await;
        (assignment_id, reference)
    }

    async fn add_payment(&self, assignment_id: Uuid, amount: Decimal) -> String {
        let reference = format!("TXN-{}", Uuid::new_v4().simple());
        sqlx::query(
            r#"
            INSERT INTO payments (id, school_id, fee_assignment_id, transaction_reference, amount)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(self.school_id)
        .bind(assignment_id)
        .bind(&reference)
        .bind(amount)
        .execute(&self.pool)
        .await
        .unwrap();
        reference
    }

    async fn count(&self, sql: &str, id: Uuid) -> i64 {
        sqlx::query_scalar(sql).bind(id).fetch_one(&self.pool).await.unwrap()
    }
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_activation_expires_previous_rate() {
    let f = pg_fixture().await;
    let first = f.activate_rate(dec!(2.0)).await;
    let second = f.activate_rate(dec!(3.0)).await;

    let rates = &f.services.fee_rates;
    let old = rates.get(&f.admin, first).await.unwrap();
    let new = rates.get(&f.admin, second).await.unwrap();

    assert_eq!(old.status, FeeRateStatus::Expired);
    assert_eq!(new.status, FeeRateStatus::Active);
    assert_eq!(old.effective_until, new.admin_approved_at);

    let active = f
        .count(
            "SELECT COUNT(*) FROM fee_rates WHERE school_id = $1 AND status = 'active'",
            f.school_id,
        )
        .await;
    assert_eq!(active, 1);
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_concurrent_activations_keep_one_active() {
    let f = pg_fixture().await;
    let rates = f.services.fee_rates.clone();

    let mut pending = Vec::new();
    for pct in [dec!(1.0), dec!(2.0), dec!(3.0), dec!(4.0)] {
        let rate = rates
            .propose(&f.proposer, Some(f.school_id), pct)
            .await
            .unwrap();
        rates.school_approve(&f.approver, rate.id).await.unwrap();
        pending.push(rate.id);
    }

    let handles: Vec<_> = pending
        .into_iter()
        .map(|id| {
            let rates = rates.clone();
            let admin = f.admin.clone();
            tokio::spawn(async move { rates.admin_approve(&admin, id).await })
        })
        .collect();

    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) | Err(AppError::ConcurrentModification(_)) => {}
            Err(e) => panic!("unexpected error {:?}", e),
        }
    }

    let active = f
        .count(
            "SELECT COUNT(*) FROM fee_rates WHERE school_id = $1 AND status = 'active'",
            f.school_id,
        )
        .await;
    assert_eq!(active, 1);
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_reconciliation_is_atomic_and_idempotent() {
    let f = pg_fixture().await;
    f.activate_rate(dec!(2.5)).await;
    let (assignment_id, reference) = f.seed_payment(dec!(1000.00), dec!(500.00)).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reconciliation = f.services.reconciliation.clone();
            let body = callback_body(&reference, SUCCESS_CODE);
            tokio::spawn(async move {
                reconciliation
                    .reconcile(CallbackPayload::parse(&body).unwrap())
                    .await
            })
        })
        .collect();

    let mut completed = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().status() == "completed" {
            completed += 1;
        }
    }
    assert_eq!(completed, 1);

    let assignment = f
        .services
        .ledger
        .for_assignment(&f.approver, assignment_id)
        .await
        .unwrap();
    assert_eq!(assignment.len(), 1);
    assert_eq!(assignment[0].amount_paid, dec!(500.00));

    let (paid, status): (Decimal, AssignmentStatus) = sqlx::query_as(
        "SELECT paid_amount, status FROM student_fee_assignments WHERE id = $1",
    )
    .bind(assignment_id)
    .fetch_one(&f.pool)
    .await
    .unwrap();
    assert_eq!(paid, dec!(500.00));
    assert_eq!(status, AssignmentStatus::Active);

    let (payment_status, fee): (PaymentStatus, Decimal) = sqlx::query_as(
        r#"
        SELECT p.status, s.fee_amount
        FROM payments p
        JOIN transaction_fee_snapshots s ON s.payment_id = p.id
        WHERE p.transaction_reference = $1
        "#,
    )
    .bind(&reference)
    .fetch_one(&f.pool)
    .await
    .unwrap();
    assert_eq!(payment_status, PaymentStatus::Completed);
    assert_eq!(fee, dec!(12.50));

    let payment_id: Uuid =
        sqlx::query_scalar("SELECT id FROM payments WHERE transaction_reference = $1")
            .bind(&reference)
            .fetch_one(&f.pool)
            .await
            .unwrap();
    let snapshot = PgFeeSnapshotRepository::new(f.pool.clone())
        .find_by_payment(payment_id)
        .await
        .unwrap()
        .expect("snapshot recorded");
    assert_eq!(snapshot.base_amount, dec!(500.00));
    assert_eq!(snapshot.total_amount, dec!(512.50));
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_fully_paid_and_failed_payments() {
    let f = pg_fixture().await;
    let (assignment_id, first) = f.seed_payment(dec!(800.00), dec!(800.00)).await;
    let failed = f.add_payment(assignment_id, dec!(100.00)).await;

    let reconciliation = &f.services.reconciliation;
    let ok = reconciliation
        .reconcile(CallbackPayload::parse(&callback_body(&first, SUCCESS_CODE)).unwrap())
        .await
        .unwrap();
    assert_eq!(ok.status(), "completed");

    let ko = reconciliation
        .reconcile(CallbackPayload::parse(&callback_body(&failed, "INS-10")).unwrap())
        .await
        .unwrap();
    assert_eq!(ko.status(), "failed");

    let status: AssignmentStatus =
        sqlx::query_scalar("SELECT status FROM student_fee_assignments WHERE id = $1")
            .bind(assignment_id)
            .fetch_one(&f.pool)
            .await
            .unwrap();
    assert_eq!(status, AssignmentStatus::FullyPaid);

    let snapshots = f
        .count(
            "SELECT COUNT(*) FROM transaction_fee_snapshots WHERE school_id = $1",
            f.school_id,
        )
        .await;
    assert_eq!(snapshots, 1);
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_sql_balance_rule_matches_status_after() {
    let f = pg_fixture().await;
    let total_due = dec!(900.00);
    let (assignment_id, first) = f.seed_payment(total_due, dec!(300.00)).await;
    let mut references = vec![first];
    for amount in [dec!(500.00), dec!(100.00), dec!(50.00)] {
        references.push(f.add_payment(assignment_id, amount).await);
    }

    let mut expected = AssignmentStatus::Active;
    let mut paid = Decimal::ZERO;
    for (reference, amount) in references.iter().zip([dec!(300.00), dec!(500.00), dec!(100.00), dec!(50.00)]) {
        f.services
            .reconciliation
            .reconcile(CallbackPayload::parse(&callback_body(reference, SUCCESS_CODE)).unwrap())
            .await
            .unwrap();

        paid += amount;
        expected = StudentFeeAssignment::status_after(expected, paid, total_due);

        let (db_paid, db_status): (Decimal, AssignmentStatus) = sqlx::query_as(
            "SELECT paid_amount, status FROM student_fee_assignments WHERE id = $1",
        )
        .bind(assignment_id)
        .fetch_one(&f.pool)
        .await
        .unwrap();
        assert_eq!(db_paid, paid);
        assert_eq!(db_status, expected, "after crediting {}", paid);
    }
    assert_eq!(expected, AssignmentStatus::FullyPaid);
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_failed_write_rolls_back_whole_completion() {
    let f = pg_fixture().await;
    let (assignment_id, reference) = f.seed_payment(dec!(1000.00), dec!(500.00)).await;
    let payment_id: Uuid =
        sqlx::query_scalar("SELECT id FROM payments WHERE transaction_reference = $1")
            .bind(&reference)
            .fetch_one(&f.pool)
            .await
            .unwrap();

    // An existing snapshot makes the last write of the completion fail
    sqlx::query(
        r#"
        INSERT INTO transaction_fee_snapshots (
            id, payment_id, school_id, fee_percentage, fee_amount, base_amount,
            total_amount, payment_method, payment_status
        ) VALUES ($1, $2, $3, 2.5, 12.50, 500.00, 512.50, 'mpesa', 'completed')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(payment_id)
    .bind(f.school_id)
    .execute(&f.pool)
    .await
    .unwrap();

    let result = f
        .services
        .reconciliation
        .reconcile(CallbackPayload::parse(&callback_body(&reference, SUCCESS_CODE)).unwrap())
        .await;
    assert!(result.is_err());

    let status: PaymentStatus = sqlx::query_scalar("SELECT status FROM payments WHERE id = $1")
        .bind(payment_id)
        .fetch_one(&f.pool)
        .await
        .unwrap();
    assert_eq!(status, PaymentStatus::Pending);

    let paid: Decimal =
        sqlx::query_scalar("SELECT paid_amount FROM student_fee_assignments WHERE id = $1")
            .bind(assignment_id)
            .fetch_one(&f.pool)
            .await
            .unwrap();
    assert_eq!(paid, Decimal::ZERO);

    let ledger = f
        .count(
            "SELECT COUNT(*) FROM payment_transactions WHERE payment_id = $1",
            payment_id,
        )
        .await;
    assert_eq!(ledger, 0);
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_audit_rows_are_append_only() {
    let f = pg_fixture().await;
    let (assignment_id, reference) = f.seed_payment(dec!(1000.00), dec!(250.00)).await;
    f.services
        .reconciliation
        .reconcile(CallbackPayload::parse(&callback_body(&reference, SUCCESS_CODE)).unwrap())
        .await
        .unwrap();

    let update = sqlx::query("UPDATE payment_transactions SET amount_paid = 1 WHERE fee_assignment_id = $1")
        .bind(assignment_id)
        .execute(&f.pool)
        .await;
    assert!(update.is_err());

    let delete = sqlx::query("DELETE FROM transaction_fee_snapshots WHERE school_id = $1")
        .bind(f.school_id)
        .execute(&f.pool)
        .await;
    assert!(delete.is_err());
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_identity_resolution_by_token_hash() {
    let f = pg_fixture().await;
    let token = format!("fg_{}", Uuid::new_v4().simple());

    sqlx::query("INSERT INTO api_keys (id, profile_id, key_hash) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(f.approver.user_id)
        .bind(hash_token(&token))
        .execute(&f.pool)
        .await
        .unwrap();

    let resolver = PgIdentityResolver::new(f.pool.clone());
    let actor = resolver.resolve(&token).await.unwrap().unwrap();
    assert_eq!(actor, f.approver);

    assert!(resolver.resolve("fg_unknown").await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires test database
async fn test_unverified_school_blocks_activation() {
    let pool = create_test_pool().await;
    let school_id = insert_school(&pool, "pending").await;
    let proposer = insert_profile(&pool, Role::SchoolStaff, Some(school_id)).await;
    let approver = insert_profile(&pool, Role::SchoolAdmin, Some(school_id)).await;
    let admin = insert_profile(&pool, Role::PlatformAdmin, None).await;

    let services = AppServices::new(
        Stores::postgres(&pool),
        &fee_config(FeeMode::Additive),
        &gateway_config(None),
    );
    let rates = &services.fee_rates;
    let rate = rates.propose(&proposer, None, dec!(2.0)).await.unwrap();
    rates.school_approve(&approver, rate.id).await.unwrap();

    let err = rates.admin_approve(&admin, rate.id).await.unwrap_err();
    assert!(matches!(err, AppError::Precondition(_)));
    assert_eq!(
        rates.get(&admin, rate.id).await.unwrap().status,
        FeeRateStatus::PendingAdmin
    );
}
