use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

/// Success envelope shared by every endpoint: `{"success": true, "data": ...}`
///
/// Errors use the matching `{"success": false, "error": {...}}` shape produced by
/// [`AppError`](crate::core::AppError).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }

    pub fn ok(data: T) -> HttpResponse {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> HttpResponse {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn with_status(status: StatusCode, data: T) -> HttpResponse {
        HttpResponse::build(status).json(Self::new(data))
    }
}
