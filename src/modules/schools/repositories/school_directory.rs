use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::Result;
use crate::modules::schools::models::VerificationStatus;

/// Read-only view of school verification, consumed by fee-rate activation
#[async_trait]
pub trait SchoolDirectory: Send + Sync {
    /// Current verification status, or `None` when the school does not exist
    async fn verification_status(&self, school_id: Uuid) -> Result<Option<VerificationStatus>>;
}

pub struct PgSchoolDirectory {
    pool: PgPool,
}

impl PgSchoolDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchoolDirectory for PgSchoolDirectory {
    async fn verification_status(&self, school_id: Uuid) -> Result<Option<VerificationStatus>> {
        let status = sqlx::query_scalar::<_, VerificationStatus>(
            r#"
            SELECT verification_status
            FROM schools
            WHERE id = $1
            "#,
        )
        .bind(school_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(status)
    }
}
