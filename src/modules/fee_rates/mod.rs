pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{FeeRate, FeeRateEvent, FeeRateStatus};
pub use repositories::{Activation, FeeRateRepository, PgFeeRateRepository};
pub use services::FeeRateService;
