pub mod error;
pub mod money;
pub mod response;

pub use error::{AppError, Result};
pub use response::ApiResponse;
