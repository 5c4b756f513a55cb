pub mod payment_repository;

pub use payment_repository::{
    CompletionOutcome, PaymentCompletion, PaymentRepository, PgPaymentRepository,
};
