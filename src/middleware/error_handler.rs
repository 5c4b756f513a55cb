use crate::core::AppError;
use actix_web::{error, web, HttpRequest};

/// Body parsing failures rendered through the standard error envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err: error::JsonPayloadError, req: &HttpRequest| {
            log_error(req, &err);
            AppError::validation(format!("Invalid request body: {}", err)).into()
        })
}

/// Query string parsing failures rendered through the standard error envelope
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: error::QueryPayloadError, req: &HttpRequest| {
        log_error(req, &err);
        AppError::validation(format!("Invalid query parameters: {}", err)).into()
    })
}

/// Path parsing failures (e.g. a non-UUID id) rendered through the standard error envelope
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, req: &HttpRequest| {
        log_error(req, &err);
        AppError::validation(format!("Invalid path parameter: {}", err)).into()
    })
}

pub fn log_error(req: &HttpRequest, err: &dyn std::fmt::Display) {
    tracing::warn!(
        method = %req.method(),
        path = %req.path(),
        error = %err,
        "Rejected malformed request"
    );
}
