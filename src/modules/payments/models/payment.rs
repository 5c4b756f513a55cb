use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::StudentFeeAssignment;

/// Payment status; `completed` and `failed` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attempt to collect money against a fee assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub school_id: Uuid,
    pub fee_assignment_id: Uuid,
    /// External gateway reference, unique across payments
    pub transaction_reference: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub installment_number: Option<i32>,
    pub payment_date: Option<DateTime<Utc>>,
    /// Last callback body received for this payment
    pub gateway_response: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A payment together with the assignment it pays towards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentContext {
    pub payment: Payment,
    pub assignment: StudentFeeAssignment,
}

/// Installment ledger entry, written once per completed payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub fee_assignment_id: Uuid,
    pub installment_number: Option<i32>,
    pub installment_label: String,
    pub amount_paid: Decimal,
    pub gateway_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
