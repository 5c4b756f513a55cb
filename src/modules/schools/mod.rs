pub mod models;
pub mod repositories;

pub use models::VerificationStatus;
pub use repositories::{PgSchoolDirectory, SchoolDirectory};
