pub mod fee_rate_service;

pub use fee_rate_service::FeeRateService;
