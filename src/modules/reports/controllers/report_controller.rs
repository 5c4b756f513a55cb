use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::core::ApiResponse;
use crate::middleware::Actor;
use crate::modules::reports::services::ReportService;

/// Query parameters for the fee report endpoint
#[derive(Debug, Deserialize)]
pub struct FeeReportQuery {
    /// Inclusive, `YYYY-MM-DD`
    pub start_date: String,
    /// Inclusive, `YYYY-MM-DD`
    pub end_date: String,
    #[serde(default)]
    pub school_id: Option<Uuid>,
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!(
            "Invalid {} format: '{}'. Expected YYYY-MM-DD",
            field, value
        ))
    })
}

/// Monthly fee summary for a school
/// GET /fee-reports
pub async fn get_fee_report(
    service: web::Data<Arc<ReportService>>,
    actor: Actor,
    query: web::Query<FeeReportQuery>,
) -> Result<HttpResponse, AppError> {
    let start_date = parse_date("start_date", &query.start_date)?;
    let end_date = parse_date("end_date", &query.end_date)?;

    let report = service
        .generate_for(&actor, query.school_id, start_date, end_date)
        .await?;

    Ok(ApiResponse::ok(report))
}

/// Configure report routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/fee-reports", web::get().to(get_fee_report));
}
