use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::middleware::Actor;
use crate::modules::reports::models::FeeReport;
use crate::modules::snapshots::repositories::FeeSnapshotRepository;

/// Longest range a single report may cover
pub const MAX_RANGE_DAYS: i64 = 366;

/// Fee reports derived from stored snapshots; read-only
pub struct ReportService {
    snapshots: Arc<dyn FeeSnapshotRepository>,
}

impl ReportService {
    pub fn new(snapshots: Arc<dyn FeeSnapshotRepository>) -> Self {
        Self { snapshots }
    }

    /// Generate the fee report for one school over an inclusive date range
    ///
    /// # Errors
    /// * `Validation` - `start_date` after `end_date`, or the range exceeds
    ///   [`MAX_RANGE_DAYS`]
    pub async fn generate(
        &self,
        school_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FeeReport> {
        validate_range(start_date, end_date)?;

        let from = start_of_day(start_date);
        let until = end_date
            .succ_opt()
            .map(start_of_day)
            .ok_or_else(|| AppError::validation(format!("end_date {} is out of range", end_date)))?;

        let snapshots = self.snapshots.list_for_school(school_id, from, until).await?;
        let report = FeeReport::from_snapshots(school_id, start_date, end_date, &snapshots);

        info!(
            school_id = %school_id,
            start_date = %start_date,
            end_date = %end_date,
            transaction_count = report.transaction_count,
            total_fee_amount = %report.total_fee_amount,
            "Fee report generated"
        );

        Ok(report)
    }

    /// Generate a report on behalf of `actor`
    ///
    /// School staff report on their own school; platform admins must name one.
    pub async fn generate_for(
        &self,
        actor: &Actor,
        school_id: Option<Uuid>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<FeeReport> {
        let school_id = match school_id.or(actor.school_id) {
            Some(school_id) => school_id,
            None if actor.role.is_platform_admin() => {
                return Err(AppError::validation("school_id is required"));
            }
            None => return Err(AppError::forbidden("Caller is not attached to a school")),
        };

        actor.ensure_can_view_school(school_id)?;
        self.generate(school_id, start_date, end_date).await
    }
}

fn validate_range(start_date: NaiveDate, end_date: NaiveDate) -> Result<()> {
    if start_date > end_date {
        return Err(AppError::validation(format!(
            "start_date ({}) must be before or equal to end_date ({})",
            start_date, end_date
        )));
    }

    let days = (end_date - start_date).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(AppError::validation(format!(
            "Report range cannot exceed {} days, got {}",
            MAX_RANGE_DAYS, days
        )));
    }

    Ok(())
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
