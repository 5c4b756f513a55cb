use std::sync::Arc;

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::ApiResponse;
use crate::middleware::Actor;
use crate::modules::payments::services::LedgerService;

/// Installment ledger for a fee assignment
/// GET /payments/assignments/{id}/transactions
pub async fn list_assignment_transactions(
    service: web::Data<Arc<LedgerService>>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let entries = service.for_assignment(&actor, path.into_inner()).await?;
    Ok(ApiResponse::ok(entries))
}
