pub mod fee_rate;

pub use fee_rate::{FeeRate, FeeRateEvent, FeeRateStatus, ProposeFeeRateRequest, RejectFeeRateRequest};
