use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::is_unique_violation;
use crate::core::{AppError, Result};
use crate::modules::fee_rates::models::{FeeRate, FeeRateStatus};

const FEE_RATE_COLUMNS: &str = r#"
    id, school_id, fee_percentage, status, proposed_by,
    school_approved_by, school_approved_at, admin_approved_by, admin_approved_at,
    rejected_by, rejected_at, rejection_reason,
    effective_from, effective_until, created_at, updated_at
"#;

/// Result of activating a rate
#[derive(Debug, Clone, Serialize)]
pub struct Activation {
    pub rate: FeeRate,
    /// Previously active rate for the same school, now expired
    pub superseded: Option<Uuid>,
}

/// Durable store of proposed, active and historical fee rates
///
/// Rows are never deleted. Every status change is conditional on the status the
/// caller read, so a concurrent writer turns into `ConcurrentModification`
/// instead of a silent overwrite.
#[async_trait]
pub trait FeeRateRepository: Send + Sync {
    async fn insert(&self, rate: &FeeRate) -> Result<FeeRate>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FeeRate>>;

    /// The single active rate for a school, if any
    async fn find_active(&self, school_id: Uuid) -> Result<Option<FeeRate>>;

    /// Full history for a school, newest first
    async fn list_by_school(&self, school_id: Uuid) -> Result<Vec<FeeRate>>;

    /// All rates in a status, oldest first
    async fn list_by_status(&self, status: FeeRateStatus) -> Result<Vec<FeeRate>>;

    /// Persist a non-activating transition if the row is still in `expected`
    async fn update_transition(&self, rate: &FeeRate, expected: FeeRateStatus) -> Result<FeeRate>;

    /// Expire the school's current active rate and activate `rate` as one unit
    ///
    /// `rate` must already carry its admin approval stamps. The stored row must
    /// still be `pending_admin` with a school approval.
    async fn activate(&self, rate: &FeeRate) -> Result<Activation>;
}

pub struct PgFeeRateRepository {
    pool: PgPool,
}

impl PgFeeRateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn stale(rate_id: Uuid, expected: FeeRateStatus) -> AppError {
    AppError::conflict(format!(
        "Fee rate '{}' is no longer {}; refetch and retry",
        rate_id, expected
    ))
}

#[async_trait]
impl FeeRateRepository for PgFeeRateRepository {
    async fn insert(&self, rate: &FeeRate) -> Result<FeeRate> {
        let sql = format!(
            r#"
            INSERT INTO fee_rates (
                id, school_id, fee_percentage, status, proposed_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            FEE_RATE_COLUMNS
        );

        let created = sqlx::query_as::<_, FeeRate>(&sql)
            .bind(rate.id)
            .bind(rate.school_id)
            .bind(rate.fee_percentage)
            .bind(rate.status)
            .bind(rate.proposed_by)
            .bind(rate.created_at)
            .bind(rate.updated_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FeeRate>> {
        let sql = format!("SELECT {} FROM fee_rates WHERE id = $1", FEE_RATE_COLUMNS);

        let rate = sqlx::query_as::<_, FeeRate>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rate)
    }

    async fn find_active(&self, school_id: Uuid) -> Result<Option<FeeRate>> {
        let sql = format!(
            "SELECT {} FROM fee_rates WHERE school_id = $1 AND status = 'active'",
            FEE_RATE_COLUMNS
        );

        let rate = sqlx::query_as::<_, FeeRate>(&sql)
            .bind(school_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rate)
    }

    async fn list_by_school(&self, school_id: Uuid) -> Result<Vec<FeeRate>> {
        let sql = format!(
            "SELECT {} FROM fee_rates WHERE school_id = $1 ORDER BY created_at DESC",
            FEE_RATE_COLUMNS
        );

        let rates = sqlx::query_as::<_, FeeRate>(&sql)
            .bind(school_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rates)
    }

    async fn list_by_status(&self, status: FeeRateStatus) -> Result<Vec<FeeRate>> {
        let sql = format!(
            "SELECT {} FROM fee_rates WHERE status = $1 ORDER BY created_at ASC",
            FEE_RATE_COLUMNS
        );

        let rates = sqlx::query_as::<_, FeeRate>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(rates)
    }

    async fn update_transition(&self, rate: &FeeRate, expected: FeeRateStatus) -> Result<FeeRate> {
        if rate.status == FeeRateStatus::Active {
            return Err(AppError::internal(
                "Activation must go through FeeRateRepository::activate",
            ));
        }

        let sql = format!(
            r#"
            UPDATE fee_rates
            SET status = $2,
                school_approved_by = $3,
                school_approved_at = $4,
                rejected_by = $5,
                rejected_at = $6,
                rejection_reason = $7,
                effective_until = $8,
                updated_at = $9
            WHERE id = $1 AND status = $10
            RETURNING {}
            "#,
            FEE_RATE_COLUMNS
        );

        let updated = sqlx::query_as::<_, FeeRate>(&sql)
            .bind(rate.id)
            .bind(rate.status)
            .bind(rate.school_approved_by)
            .bind(rate.school_approved_at)
            .bind(rate.rejected_by)
            .bind(rate.rejected_at)
            .bind(&rate.rejection_reason)
            .bind(rate.effective_until)
            .bind(rate.updated_at)
            .bind(expected)
            .fetch_optional(&self.pool)
            .await?;

        updated.ok_or_else(|| {
            tracing::warn!(rate_id = %rate.id, expected = %expected, "Conditional fee rate update matched no rows");
            stale(rate.id, expected)
        })
    }

    async fn activate(&self, rate: &FeeRate) -> Result<Activation> {
        let activated_at = rate.admin_approved_at.ok_or_else(|| {
            AppError::internal("Fee rate must be admin-approved before activation")
        })?;

        let mut tx = self.pool.begin().await?;

        // Serialize activations per school for the rest of this transaction
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(rate.school_id)
            .execute(&mut *tx)
            .await?;

        let superseded: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE fee_rates
            SET status = 'expired', effective_until = $2, updated_at = $2
            WHERE school_id = $1 AND status = 'active' AND id <> $3
            RETURNING id
            "#,
        )
        .bind(rate.school_id)
        .bind(activated_at)
        .bind(rate.id)
        .fetch_optional(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            UPDATE fee_rates
            SET status = 'active',
                admin_approved_by = $2,
                admin_approved_at = $3,
                effective_from = $3,
                effective_until = NULL,
                updated_at = $3
            WHERE id = $1 AND status = 'pending_admin' AND school_approved_at IS NOT NULL
            RETURNING {}
            "#,
            FEE_RATE_COLUMNS
        );

        let activated = sqlx::query_as::<_, FeeRate>(&sql)
            .bind(rate.id)
            .bind(rate.admin_approved_by)
            .bind(activated_at)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    stale(rate.id, FeeRateStatus::PendingAdmin)
                } else {
                    AppError::Database(e)
                }
            })?;

        match activated {
            Some(activated) => {
                tx.commit().await?;
                Ok(Activation {
                    rate: activated,
                    superseded,
                })
            }
            None => {
                // undo the expiry above
                tx.rollback().await?;
                tracing::warn!(rate_id = %rate.id, "Fee rate activation lost a race");
                Err(stale(rate.id, FeeRateStatus::PendingAdmin))
            }
        }
    }
}
