pub mod fee_rate_repository;

pub use fee_rate_repository::{Activation, FeeRateRepository, PgFeeRateRepository};
