use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Malformed input (bad percentage range, missing rejection reason)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Role, ownership or self-approval violations
    #[error("Forbidden: {0}")]
    Authorization(String),

    /// Operation attempted from a status that does not permit it
    #[error("Invalid state: {message} (current status: {current})")]
    InvalidState { current: String, message: String },

    /// Business precondition unmet (e.g. school not verified)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A conditional update matched zero rows because the row moved on
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Missing or invalid credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Gateway callback that could not be understood; the gateway should redeliver
    #[error("Malformed callback: {0}")]
    MalformedCallback(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let mut error = serde_json::json!({
            "code": self.code(),
            "message": self.to_string(),
        });

        if let AppError::InvalidState { current, .. } = self {
            error["current_status"] = serde_json::Value::String(current.clone());
        }

        HttpResponse::build(status_code).json(serde_json::json!({
            "success": false,
            "error": error,
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::InvalidState { .. } => StatusCode::BAD_REQUEST,
            AppError::Precondition(_) => StatusCode::FORBIDDEN,
            AppError::ConcurrentModification(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::MalformedCallback(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Authorization(msg.into())
    }

    pub fn invalid_state(current: impl ToString, msg: impl Into<String>) -> Self {
        AppError::InvalidState {
            current: current.to_string(),
            message: msg.into(),
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        AppError::Precondition(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::ConcurrentModification(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Stable machine-readable code placed in the error envelope
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Authorization(_) => "AUTHORIZATION_ERROR",
            AppError::InvalidState { .. } => "INVALID_STATE",
            AppError::Precondition(_) => "PRECONDITION_FAILED",
            AppError::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Database(_) => "STORAGE_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::MalformedCallback(_) => "MALFORMED_CALLBACK",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Json(_) => "INVALID_JSON",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may safely retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::MalformedCallback(_)
                | AppError::ConcurrentModification(_)
                | AppError::Internal(_)
        )
    }
}

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Whether a sqlx error is a unique constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}
