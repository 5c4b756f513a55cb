use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::modules::fee_rates::repositories::FeeRateRepository;
use crate::modules::payments::models::{
    AssignmentStatus, CallbackOutcome, CallbackPayload, GatewayProfile, PaymentContext,
    PaymentPlan, PaymentStatus, PaymentTransaction,
};
use crate::modules::payments::repositories::{
    CompletionOutcome, PaymentCompletion, PaymentRepository,
};
use crate::modules::snapshots::services::FeeSnapshotRecorder;

/// What a callback did, returned to the gateway as `data`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReconcileResult {
    Completed {
        payment_id: Uuid,
        transaction_reference: String,
        installment_label: String,
        amount_paid: Decimal,
        fee_amount: Decimal,
        paid_amount: Decimal,
        assignment_status: AssignmentStatus,
    },
    Failed {
        payment_id: Uuid,
        transaction_reference: String,
        result_code: String,
    },
    /// Payment was already terminal; nothing changed
    Duplicate {
        payment_id: Uuid,
        transaction_reference: String,
        payment_status: PaymentStatus,
    },
}

impl ReconcileResult {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
            Self::Duplicate { .. } => "duplicate",
        }
    }
}

/// Applies gateway callbacks to payments exactly once
pub struct ReconciliationService {
    payments: Arc<dyn PaymentRepository>,
    rates: Arc<dyn FeeRateRepository>,
    recorder: FeeSnapshotRecorder,
    gateway: GatewayProfile,
}

impl ReconciliationService {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        rates: Arc<dyn FeeRateRepository>,
        recorder: FeeSnapshotRecorder,
        gateway: GatewayProfile,
    ) -> Self {
        Self {
            payments,
            rates,
            recorder,
            gateway,
        }
    }

    /// Reconcile one callback delivery
    ///
    /// Deliveries for payments that are already terminal, including a delivery
    /// that loses a race against a concurrent one, return `Duplicate`.
    ///
    /// # Errors
    /// * `NotFound` - no payment carries the callback's reference
    /// * `Database` - storage unavailable; nothing was written
    pub async fn reconcile(&self, payload: CallbackPayload) -> Result<ReconcileResult> {
        let context = self
            .payments
            .find_context_by_reference(&payload.transaction_reference)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!(
                    "No payment with transaction reference '{}'",
                    payload.transaction_reference
                ))
            })?;

        if context.payment.status.is_terminal() {
            return Ok(duplicate(&context, context.payment.status));
        }

        match self.gateway.classify(&payload.result_code) {
            CallbackOutcome::Failure => self.fail(context, payload).await,
            CallbackOutcome::Success => self.complete(context, payload).await,
        }
    }

    async fn fail(&self, context: PaymentContext, payload: CallbackPayload) -> Result<ReconcileResult> {
        let payment = &context.payment;

        if !self.payments.mark_failed(payment.id, &payload.raw).await? {
            let status = self.current_status(&context).await?;
            return Ok(duplicate(&context, status));
        }

        info!(
            payment_id = %payment.id,
            transaction_reference = %payment.transaction_reference,
            result_code = %payload.result_code,
            from = %PaymentStatus::Pending,
            to = %PaymentStatus::Failed,
            "Payment failed"
        );

        Ok(ReconcileResult::Failed {
            payment_id: payment.id,
            transaction_reference: payment.transaction_reference.clone(),
            result_code: payload.result_code,
        })
    }

    async fn complete(
        &self,
        context: PaymentContext,
        payload: CallbackPayload,
    ) -> Result<ReconcileResult> {
        let payment = &context.payment;

        // Everything the snapshot and ledger need is read before the status flips.
        let plan = match context.assignment.payment_plan_id {
            Some(plan_id) => self.payments.find_plan(plan_id).await?,
            None => None,
        };
        let installment_label = PaymentPlan::resolve_label(plan.as_ref(), payment.installment_number);
        let active_rate = self.rates.find_active(payment.school_id).await?;

        let now = Utc::now();
        let snapshot = self.recorder.snapshot_for(payment, active_rate.as_ref(), now);
        let fee_amount = snapshot.fee_amount;

        let completion = PaymentCompletion {
            payment_id: payment.id,
            fee_assignment_id: context.assignment.id,
            amount: payment.amount,
            completed_at: now,
            gateway_response: payload.raw,
            transaction: PaymentTransaction {
                id: Uuid::new_v4(),
                payment_id: payment.id,
                fee_assignment_id: context.assignment.id,
                installment_number: payment.installment_number,
                installment_label: installment_label.clone(),
                amount_paid: payment.amount,
                gateway_transaction_id: payload.gateway_transaction_id,
                created_at: now,
            },
            snapshot,
        };

        match self.payments.complete(&completion).await? {
            CompletionOutcome::Applied(assignment) => {
                info!(
                    payment_id = %payment.id,
                    transaction_reference = %payment.transaction_reference,
                    fee_assignment_id = %assignment.id,
                    installment = %installment_label,
                    amount = %payment.amount,
                    fee_amount = %fee_amount,
                    paid_amount = %assignment.paid_amount,
                    assignment_status = %assignment.status,
                    from = %PaymentStatus::Pending,
                    to = %PaymentStatus::Completed,
                    "Payment completed"
                );

                Ok(ReconcileResult::Completed {
                    payment_id: payment.id,
                    transaction_reference: payment.transaction_reference.clone(),
                    installment_label,
                    amount_paid: payment.amount,
                    fee_amount,
                    paid_amount: assignment.paid_amount,
                    assignment_status: assignment.status,
                })
            }
            CompletionOutcome::AlreadyProcessed => {
                let status = self.current_status(&context).await?;
                Ok(duplicate(&context, status))
            }
        }
    }

    /// Status of a payment whose conditional update matched nothing
    async fn current_status(&self, context: &PaymentContext) -> Result<PaymentStatus> {
        let current = self
            .payments
            .find_context_by_reference(&context.payment.transaction_reference)
            .await?
            .map(|c| c.payment.status);

        match current {
            Some(status) => Ok(status),
            None => Err(AppError::not_found(format!(
                "Payment '{}' disappeared during reconciliation",
                context.payment.id
            ))),
        }
    }
}

fn duplicate(context: &PaymentContext, status: PaymentStatus) -> ReconcileResult {
    info!(
        payment_id = %context.payment.id,
        transaction_reference = %context.payment.transaction_reference,
        payment_status = %status,
        "Duplicate callback ignored"
    );

    ReconcileResult::Duplicate {
        payment_id: context.payment.id,
        transaction_reference: context.payment.transaction_reference.clone(),
        payment_status: status,
    }
}
