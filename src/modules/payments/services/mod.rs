pub mod ledger_service;
pub mod reconciliation_service;
pub mod webhook_verifier;

pub use ledger_service::LedgerService;
pub use reconciliation_service::{ReconcileResult, ReconciliationService};
pub use webhook_verifier::{WebhookVerifier, SIGNATURE_HEADER};
