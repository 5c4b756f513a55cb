//! Fee-rate governance and payment reconciliation service
//!
//! School fee rates move through a two-party approval workflow before they
//! take effect; gateway callbacks are reconciled against fee assignments
//! exactly once, freezing the fee charged on each payment in a snapshot.

pub mod app;
pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

pub use app::AppServices;

// Re-export commonly used types
pub use modules::fee_rates;
pub use modules::payments;
pub use modules::reports;
pub use modules::snapshots;
