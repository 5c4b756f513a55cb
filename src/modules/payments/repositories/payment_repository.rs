use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::is_unique_violation;
use crate::core::{AppError, Result};
use crate::modules::payments::models::{
    Payment, PaymentContext, PaymentPlan, PaymentTransaction, StudentFeeAssignment,
};
use crate::modules::snapshots::models::FeeSnapshot;
use crate::modules::snapshots::repositories::PgFeeSnapshotRepository;

const PAYMENT_COLUMNS: &str = r#"
    id, school_id, fee_assignment_id, transaction_reference, amount, status,
    payment_method, installment_number, payment_date, gateway_response,
    created_at, updated_at
"#;

const ASSIGNMENT_COLUMNS: &str = r#"
    id, school_id, student_id, payment_plan_id, total_due, paid_amount, status,
    created_at, updated_at
"#;

/// Everything written when a payment completes
#[derive(Debug, Clone)]
pub struct PaymentCompletion {
    pub payment_id: Uuid,
    pub fee_assignment_id: Uuid,
    pub amount: Decimal,
    pub completed_at: DateTime<Utc>,
    pub gateway_response: Value,
    pub transaction: PaymentTransaction,
    pub snapshot: FeeSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// All writes committed; carries the assignment after crediting
    Applied(StudentFeeAssignment),
    /// The payment was no longer pending; nothing was written
    AlreadyProcessed,
}

/// Storage for payments, assignments and the installment ledger
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Payment by gateway reference, joined with its assignment
    async fn find_context_by_reference(&self, reference: &str) -> Result<Option<PaymentContext>>;

    async fn find_plan(&self, plan_id: Uuid) -> Result<Option<PaymentPlan>>;

    async fn find_assignment(&self, assignment_id: Uuid) -> Result<Option<StudentFeeAssignment>>;

    /// `pending → failed`; returns false when the payment was already terminal
    async fn mark_failed(&self, payment_id: Uuid, gateway_response: &Value) -> Result<bool>;

    /// `pending → completed` with balance credit, ledger entry and fee snapshot
    ///
    /// All four writes commit together or not at all. A payment that is no longer
    /// pending yields `AlreadyProcessed` without writing anything.
    async fn complete(&self, completion: &PaymentCompletion) -> Result<CompletionOutcome>;

    /// Ledger entries for an assignment, oldest first
    async fn ledger_for_assignment(&self, assignment_id: Uuid) -> Result<Vec<PaymentTransaction>>;
}

pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn find_context_by_reference(&self, reference: &str) -> Result<Option<PaymentContext>> {
        let sql = format!(
            "SELECT {} FROM payments WHERE transaction_reference = $1",
            PAYMENT_COLUMNS
        );

        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        let Some(payment) = payment else {
            return Ok(None);
        };

        let assignment = self
            .find_assignment(payment.fee_assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::internal(format!(
                    "Payment '{}' references missing fee assignment '{}'",
                    payment.id, payment.fee_assignment_id
                ))
            })?;

        Ok(Some(PaymentContext { payment, assignment }))
    }

    async fn find_plan(&self, plan_id: Uuid) -> Result<Option<PaymentPlan>> {
        let plan = sqlx::query_as::<_, PaymentPlan>(
            r#"
            SELECT id, school_id, name, plan_type, installments, created_at
            FROM payment_plans
            WHERE id = $1
            "#,
        )
        .bind(plan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(plan)
    }

    async fn find_assignment(&self, assignment_id: Uuid) -> Result<Option<StudentFeeAssignment>> {
        let sql = format!(
            "SELECT {} FROM student_fee_assignments WHERE id = $1",
            ASSIGNMENT_COLUMNS
        );

        let assignment = sqlx::query_as::<_, StudentFeeAssignment>(&sql)
            .bind(assignment_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(assignment)
    }

    async fn mark_failed(&self, payment_id: Uuid, gateway_response: &Value) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed', payment_date = NULL, gateway_response = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(payment_id)
        .bind(gateway_response)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn complete(&self, completion: &PaymentCompletion) -> Result<CompletionOutcome> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken here makes a concurrent delivery wait, then see a
        // non-pending status and match nothing.
        let claimed: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE payments
            SET status = 'completed', payment_date = $2, gateway_response = $3, updated_at = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(completion.payment_id)
        .bind(completion.completed_at)
        .bind(&completion.gateway_response)
        .fetch_optional(&mut *tx)
        .await?;

        if claimed.is_none() {
            tx.rollback().await?;
            return Ok(CompletionOutcome::AlreadyProcessed);
        }

        let sql = format!(
            r#"
            UPDATE student_fee_assignments
            SET paid_amount = paid_amount + $2,
                status = CASE
                    WHEN status = 'fully_paid' OR paid_amount + $2 >= total_due THEN 'fully_paid'
                    ELSE 'active'
                END,
                updated_at = $3
            WHERE id = $1
            RETURNING {}
            "#,
            ASSIGNMENT_COLUMNS
        );

        let assignment = sqlx::query_as::<_, StudentFeeAssignment>(&sql)
            .bind(completion.fee_assignment_id)
            .bind(completion.amount)
            .bind(completion.completed_at)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "Fee assignment '{}' not found",
                    completion.fee_assignment_id
                ))
            })?;

        let entry = &completion.transaction;
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, payment_id, fee_assignment_id, installment_number, installment_label,
                amount_paid, gateway_transaction_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.payment_id)
        .bind(entry.fee_assignment_id)
        .bind(entry.installment_number)
        .bind(&entry.installment_label)
        .bind(entry.amount_paid)
        .bind(&entry.gateway_transaction_id)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!(
                    "Ledger entry already exists for payment '{}'",
                    entry.payment_id
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        PgFeeSnapshotRepository::insert_with_tx(&mut tx, &completion.snapshot).await?;

        tx.commit().await?;

        Ok(CompletionOutcome::Applied(assignment))
    }

    async fn ledger_for_assignment(&self, assignment_id: Uuid) -> Result<Vec<PaymentTransaction>> {
        let entries = sqlx::query_as::<_, PaymentTransaction>(
            r#"
            SELECT id, payment_id, fee_assignment_id, installment_number, installment_label,
                   amount_paid, gateway_transaction_id, created_at
            FROM payment_transactions
            WHERE fee_assignment_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
