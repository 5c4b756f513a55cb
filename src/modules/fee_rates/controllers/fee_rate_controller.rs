use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::ApiResponse;
use crate::middleware::Actor;
use crate::modules::fee_rates::models::{FeeRateStatus, ProposeFeeRateRequest, RejectFeeRateRequest};
use crate::modules::fee_rates::services::FeeRateService;

/// Query parameters for listing fee rates
#[derive(Debug, Deserialize)]
pub struct ListFeeRatesQuery {
    #[serde(default)]
    pub school_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<FeeRateStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ActiveRateQuery {
    pub school_id: Uuid,
}

/// Propose a fee rate
/// POST /fee-rates
pub async fn propose_fee_rate(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    request: web::Json<ProposeFeeRateRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    let rate = service
        .propose(&actor, request.school_id, request.fee_percentage)
        .await?;

    Ok(ApiResponse::created(rate))
}

/// List fee rates
/// GET /fee-rates
pub async fn list_fee_rates(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    query: web::Query<ListFeeRatesQuery>,
) -> Result<HttpResponse, AppError> {
    let rates = service.list(&actor, query.school_id, query.status).await?;
    Ok(ApiResponse::ok(rates))
}

/// Currently active rate for a school; `data` is null when there is none
/// GET /fee-rates/active
pub async fn get_active_rate(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    query: web::Query<ActiveRateQuery>,
) -> Result<HttpResponse, AppError> {
    let rate = service.active_rate(&actor, query.school_id).await?;
    Ok(ApiResponse::ok(rate))
}

/// GET /fee-rates/{id}
pub async fn get_fee_rate(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let rate = service.get(&actor, path.into_inner()).await?;
    Ok(ApiResponse::ok(rate))
}

/// POST /fee-rates/{id}/school-approve
pub async fn school_approve(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let rate = service.school_approve(&actor, path.into_inner()).await?;
    Ok(ApiResponse::ok(rate))
}

/// POST /fee-rates/{id}/school-reject
pub async fn school_reject(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    path: web::Path<Uuid>,
    request: web::Json<RejectFeeRateRequest>,
) -> Result<HttpResponse, AppError> {
    let rate = service
        .school_reject(&actor, path.into_inner(), &request.reason)
        .await?;
    Ok(ApiResponse::ok(rate))
}

/// Final approval; the response carries the activated rate and the id of the
/// rate it superseded, if any
/// POST /fee-rates/{id}/admin-approve
pub async fn admin_approve(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let activation = service.admin_approve(&actor, path.into_inner()).await?;
    Ok(ApiResponse::ok(activation))
}

/// POST /fee-rates/{id}/admin-reject
pub async fn admin_reject(
    service: web::Data<Arc<FeeRateService>>,
    actor: Actor,
    path: web::Path<Uuid>,
    request: web::Json<RejectFeeRateRequest>,
) -> Result<HttpResponse, AppError> {
    let rate = service
        .admin_reject(&actor, path.into_inner(), &request.reason)
        .await?;
    Ok(ApiResponse::ok(rate))
}

/// Configure fee rate routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/fee-rates")
            .route("", web::post().to(propose_fee_rate))
            .route("", web::get().to(list_fee_rates))
            .route("/active", web::get().to(get_active_rate))
            .route("/{id}", web::get().to(get_fee_rate))
            .route("/{id}/school-approve", web::post().to(school_approve))
            .route("/{id}/school-reject", web::post().to(school_reject))
            .route("/{id}/admin-approve", web::post().to(admin_approve))
            .route("/{id}/admin-reject", web::post().to(admin_reject)),
    );
}
