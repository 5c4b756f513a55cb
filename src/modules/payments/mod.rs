pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{
    AssignmentStatus, CallbackPayload, GatewayProfile, Payment, PaymentStatus, PaymentTransaction,
    StudentFeeAssignment,
};
pub use repositories::{PaymentRepository, PgPaymentRepository};
pub use services::{LedgerService, ReconcileResult, ReconciliationService, WebhookVerifier};
