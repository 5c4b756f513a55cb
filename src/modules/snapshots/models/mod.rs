pub mod fee_snapshot;

pub use fee_snapshot::{FeeMode, FeeSnapshot};
