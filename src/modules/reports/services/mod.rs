pub mod report_service;

pub use report_service::{ReportService, MAX_RANGE_DAYS};
