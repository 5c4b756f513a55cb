pub mod controllers;
pub mod models;
pub mod services;

pub use models::{FeeReport, MonthlyFeeSummary, PaymentMethodBreakdown};
pub use services::ReportService;
