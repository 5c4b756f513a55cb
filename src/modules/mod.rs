pub mod fee_rates;
pub mod health;
pub mod payments;
pub mod reports;
pub mod schools;
pub mod snapshots;
