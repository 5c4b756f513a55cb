pub mod fee_snapshot_repository;

pub use fee_snapshot_repository::{FeeSnapshotRepository, PgFeeSnapshotRepository};
