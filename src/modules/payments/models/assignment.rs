use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{money, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Active,
    FullyPaid,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::FullyPaid => "fully_paid",
        }
    }
}

impl std::fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student's obligation under a payment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StudentFeeAssignment {
    pub id: Uuid,
    pub school_id: Uuid,
    pub student_id: Uuid,
    pub payment_plan_id: Option<Uuid>,
    pub total_due: Decimal,
    /// Only ever increased, by completed-payment reconciliation
    pub paid_amount: Decimal,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentFeeAssignment {
    /// Apply a completed payment to the balance
    ///
    /// `fully_paid` is reached once `paid_amount >= total_due` and never left.
    pub fn credit(&mut self, amount: Decimal, at: DateTime<Utc>) -> Result<()> {
        let amount = money::validate_amount(amount)?;

        self.paid_amount += amount;
        self.status = Self::status_after(self.status, self.paid_amount, self.total_due);
        self.updated_at = at;
        Ok(())
    }

    /// Status after a credit; the SQL `CASE` in `PgPaymentRepository::complete`
    /// encodes the same rule and must stay in step with it
    pub fn status_after(
        current: AssignmentStatus,
        paid_amount: Decimal,
        total_due: Decimal,
    ) -> AssignmentStatus {
        if current == AssignmentStatus::FullyPaid || paid_amount >= total_due {
            AssignmentStatus::FullyPaid
        } else {
            AssignmentStatus::Active
        }
    }

    pub fn outstanding(&self) -> Decimal {
        (self.total_due - self.paid_amount).max(Decimal::ZERO)
    }
}
