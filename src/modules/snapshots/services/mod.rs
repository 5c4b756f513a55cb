pub mod fee_snapshot_recorder;

pub use fee_snapshot_recorder::FeeSnapshotRecorder;
