use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ledger label for payments that settle the whole fee at once
pub const FULL_PAYMENT_LABEL: &str = "Full Payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    OneTime,
    Upfront,
    Installments,
}

/// One scheduled installment, e.g. `{"number": 1, "label": "Term 1"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentSpec {
    pub number: i32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PaymentPlan {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
    pub plan_type: PlanType,
    #[sqlx(json)]
    pub installments: Vec<InstallmentSpec>,
    pub created_at: DateTime<Utc>,
}

impl PaymentPlan {
    /// Label recorded in the installment ledger for `installment_number`
    pub fn installment_label(&self, installment_number: Option<i32>) -> String {
        match (self.plan_type, installment_number) {
            (PlanType::OneTime | PlanType::Upfront, _) | (_, None) => FULL_PAYMENT_LABEL.to_string(),
            (PlanType::Installments, Some(number)) => self
                .installments
                .iter()
                .find(|spec| spec.number == number)
                .map(|spec| spec.label.clone())
                .unwrap_or_else(|| fallback_label(number)),
        }
    }

    /// Same as [`installment_label`](Self::installment_label) for an assignment
    /// that may have no plan attached
    pub fn resolve_label(plan: Option<&PaymentPlan>, installment_number: Option<i32>) -> String {
        match (plan, installment_number) {
            (Some(plan), number) => plan.installment_label(number),
            (None, Some(number)) => fallback_label(number),
            (None, None) => FULL_PAYMENT_LABEL.to_string(),
        }
    }
}

fn fallback_label(number: i32) -> String {
    format!("Installment {}", number)
}
