pub mod school_directory;

pub use school_directory::{PgSchoolDirectory, SchoolDirectory};
