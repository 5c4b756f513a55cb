use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::core::money;
use crate::modules::fee_rates::models::FeeRate;
use crate::modules::payments::models::{Payment, PaymentStatus};
use crate::modules::snapshots::models::{FeeMode, FeeSnapshot};

/// Computes the fee charged on a completed payment
///
/// The recorder is pure; persisting the snapshot belongs to the reconciliation
/// unit of work.
#[derive(Debug, Clone)]
pub struct FeeSnapshotRecorder {
    default_percentage: Decimal,
    mode: FeeMode,
}

impl FeeSnapshotRecorder {
    pub fn new(default_percentage: Decimal, mode: FeeMode) -> Self {
        Self {
            default_percentage,
            mode,
        }
    }

    /// Fee and total for `base_amount` at `fee_percentage`
    ///
    /// `fee = round_half_up(base * pct / 100, 2)`
    pub fn compute(&self, base_amount: Decimal, fee_percentage: Decimal) -> (Decimal, Decimal) {
        let base_amount = money::round_money(base_amount);
        let fee_amount = money::percentage_of(base_amount, fee_percentage);
        (fee_amount, self.mode.total(base_amount, fee_amount))
    }

    /// Snapshot for `payment` using the school's active rate, or the platform
    /// default when none is active
    pub fn snapshot_for(
        &self,
        payment: &Payment,
        active_rate: Option<&FeeRate>,
        at: DateTime<Utc>,
    ) -> FeeSnapshot {
        let (fee_rate_id, fee_percentage) = match active_rate {
            Some(rate) => (Some(rate.id), rate.fee_percentage),
            None => (None, self.default_percentage),
        };

        let (fee_amount, total_amount) = self.compute(payment.amount, fee_percentage);

        FeeSnapshot {
            id: Uuid::new_v4(),
            payment_id: payment.id,
            school_id: payment.school_id,
            fee_rate_id,
            fee_percentage,
            fee_amount,
            base_amount: money::round_money(payment.amount),
            total_amount,
            payment_method: payment.payment_method.clone(),
            payment_status: PaymentStatus::Completed,
            created_at: at,
        }
    }
}
