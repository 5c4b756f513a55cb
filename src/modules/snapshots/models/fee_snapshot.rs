use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::modules::payments::models::PaymentStatus;

/// How the platform fee relates to what the payer is charged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeMode {
    /// Fee is charged on top of the tuition amount: `total = base + fee`
    #[default]
    Additive,
    /// Fee is withheld from what the school receives: `total = base`
    Deductive,
}

impl FeeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Additive => "additive",
            Self::Deductive => "deductive",
        }
    }

    /// Amount charged for `base_amount` carrying `fee_amount`
    pub fn total(&self, base_amount: Decimal, fee_amount: Decimal) -> Decimal {
        match self {
            Self::Additive => base_amount + fee_amount,
            Self::Deductive => base_amount,
        }
    }
}

impl std::fmt::Display for FeeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FeeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "additive" => Ok(Self::Additive),
            "deductive" => Ok(Self::Deductive),
            other => Err(format!(
                "Invalid FEE_MODE '{}': expected 'additive' or 'deductive'",
                other
            )),
        }
    }
}

/// Fee actually charged on one completed payment
///
/// Written once inside the reconciliation unit of work and never updated, so
/// later rate changes do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FeeSnapshot {
    pub id: Uuid,
    pub payment_id: Uuid,
    pub school_id: Uuid,
    /// `None` when no rate was active and the platform default applied
    pub fee_rate_id: Option<Uuid>,
    pub fee_percentage: Decimal,
    pub fee_amount: Decimal,
    pub base_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}
