use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::core::Result;
use crate::modules::snapshots::models::FeeSnapshot;

const SNAPSHOT_COLUMNS: &str = r#"
    id, payment_id, school_id, fee_rate_id, fee_percentage, fee_amount,
    base_amount, total_amount, payment_method, payment_status, created_at
"#;

/// Read side of the fee snapshot audit table
#[async_trait]
pub trait FeeSnapshotRepository: Send + Sync {
    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<FeeSnapshot>>;

    /// Snapshots for a school created in `[from, until)`, oldest first
    async fn list_for_school(
        &self,
        school_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<FeeSnapshot>>;
}

pub struct PgFeeSnapshotRepository {
    pool: PgPool,
}

impl PgFeeSnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a snapshot inside the caller's transaction
    ///
    /// `UNIQUE(payment_id)` rejects a second snapshot for the same payment.
    pub async fn insert_with_tx(
        tx: &mut Transaction<'_, Postgres>,
        snapshot: &FeeSnapshot,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO transaction_fee_snapshots (
                id, payment_id, school_id, fee_rate_id, fee_percentage, fee_amount,
                base_amount, total_amount, payment_method, payment_status, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(snapshot.id)
        .bind(snapshot.payment_id)
        .bind(snapshot.school_id)
        .bind(snapshot.fee_rate_id)
        .bind(snapshot.fee_percentage)
        .bind(snapshot.fee_amount)
        .bind(snapshot.base_amount)
        .bind(snapshot.total_amount)
        .bind(&snapshot.payment_method)
        .bind(snapshot.payment_status)
        .bind(snapshot.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl FeeSnapshotRepository for PgFeeSnapshotRepository {
    async fn find_by_payment(&self, payment_id: Uuid) -> Result<Option<FeeSnapshot>> {
        let sql = format!(
            "SELECT {} FROM transaction_fee_snapshots WHERE payment_id = $1",
            SNAPSHOT_COLUMNS
        );

        let snapshot = sqlx::query_as::<_, FeeSnapshot>(&sql)
            .bind(payment_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(snapshot)
    }

    async fn list_for_school(
        &self,
        school_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<FeeSnapshot>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM transaction_fee_snapshots
            WHERE school_id = $1 AND created_at >= $2 AND created_at < $3
            ORDER BY created_at ASC
            "#,
            SNAPSHOT_COLUMNS
        );

        let snapshots = sqlx::query_as::<_, FeeSnapshot>(&sql)
            .bind(school_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;

        Ok(snapshots)
    }
}
