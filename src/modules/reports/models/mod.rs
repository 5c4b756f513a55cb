pub mod fee_report;

pub use fee_report::{FeeReport, MonthlyFeeSummary, PaymentMethodBreakdown};
