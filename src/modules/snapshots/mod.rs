pub mod models;
pub mod repositories;
pub mod services;

pub use models::{FeeMode, FeeSnapshot};
pub use repositories::{FeeSnapshotRepository, PgFeeSnapshotRepository};
pub use services::FeeSnapshotRecorder;
