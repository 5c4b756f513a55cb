use std::sync::Arc;

use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::middleware::Actor;
use crate::modules::payments::models::PaymentTransaction;
use crate::modules::payments::repositories::PaymentRepository;

/// Read access to the installment ledger
pub struct LedgerService {
    payments: Arc<dyn PaymentRepository>,
}

impl LedgerService {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn for_assignment(
        &self,
        actor: &Actor,
        assignment_id: Uuid,
    ) -> Result<Vec<PaymentTransaction>> {
        let assignment = self
            .payments
            .find_assignment(assignment_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Fee assignment '{}' not found", assignment_id))
            })?;

        actor.ensure_can_view_school(assignment.school_id)?;
        self.payments.ledger_for_assignment(assignment_id).await
    }
}
