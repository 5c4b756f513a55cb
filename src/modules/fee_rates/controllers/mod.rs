pub mod fee_rate_controller;

pub use fee_rate_controller::configure;
