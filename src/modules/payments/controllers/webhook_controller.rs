use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{error, info, warn};

use crate::core::error::AppError;
use crate::core::ApiResponse;
use crate::modules::payments::models::CallbackPayload;
use crate::modules::payments::services::{ReconciliationService, WebhookVerifier, SIGNATURE_HEADER};

/// Gateway payment callback
/// POST /payments/webhook
///
/// The body is read raw so the signature covers exactly what the gateway sent.
///
/// # Returns
/// * `200 OK` - processed; `data.status` is `completed`, `failed` or `duplicate`
/// * `401 Unauthorized` - signature missing or invalid
/// * `404 Not Found` - no payment carries the reference
/// * `500 Internal Server Error` - malformed payload or storage failure; the gateway retries
pub async fn receive_callback(
    req: HttpRequest,
    body: web::Bytes,
    service: web::Data<Arc<ReconciliationService>>,
    verifier: web::Data<Arc<WebhookVerifier>>,
) -> Result<HttpResponse, AppError> {
    let signature = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    verifier.verify(signature, &body)?;

    let payload = CallbackPayload::parse(&body).map_err(|e| {
        warn!(error = %e, body_len = body.len(), "Rejected malformed payment callback");
        e
    })?;

    info!(
        transaction_reference = %payload.transaction_reference,
        result_code = %payload.result_code,
        "Received payment callback"
    );

    let reference = payload.transaction_reference.clone();
    let result = service.reconcile(payload).await.map_err(|e| {
        if e.is_retryable() {
            error!(transaction_reference = %reference, error = %e, "Payment callback failed");
        } else {
            warn!(transaction_reference = %reference, error = %e, "Payment callback rejected");
        }
        e
    })?;

    Ok(ApiResponse::ok(result))
}
