pub mod school;

pub use school::VerificationStatus;
