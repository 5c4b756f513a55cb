use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::{AppError, Result};
use crate::middleware::Actor;
use crate::modules::fee_rates::models::{FeeRate, FeeRateEvent, FeeRateStatus};
use crate::modules::fee_rates::repositories::{Activation, FeeRateRepository};
use crate::modules::schools::SchoolDirectory;

/// Fee rate approval workflow
///
/// Every operation reads the persisted rate, checks the caller and the
/// transition, and only then writes. Writes are conditional on the status that
/// was read.
pub struct FeeRateService {
    rates: Arc<dyn FeeRateRepository>,
    schools: Arc<dyn SchoolDirectory>,
}

impl FeeRateService {
    pub fn new(rates: Arc<dyn FeeRateRepository>, schools: Arc<dyn SchoolDirectory>) -> Self {
        Self { rates, schools }
    }

    /// Propose a new rate for the caller's school
    ///
    /// # Errors
    /// * `Validation` - percentage outside [0, 100]
    /// * `Authorization` - caller is not staff of the school
    pub async fn propose(
        &self,
        actor: &Actor,
        school_id: Option<Uuid>,
        fee_percentage: Decimal,
    ) -> Result<FeeRate> {
        let school_id = school_id
            .or(actor.school_id)
            .ok_or_else(|| AppError::validation("school_id is required"))?;
        actor.ensure_school_member(school_id)?;

        let rate = FeeRate::propose(school_id, fee_percentage, actor.user_id, Utc::now())?;
        let rate = self.rates.insert(&rate).await?;

        info!(
            rate_id = %rate.id,
            school_id = %rate.school_id,
            fee_percentage = %rate.fee_percentage,
            proposed_by = %rate.proposed_by,
            "Fee rate proposed"
        );

        Ok(rate)
    }

    pub async fn school_approve(&self, actor: &Actor, rate_id: Uuid) -> Result<FeeRate> {
        let mut rate = self.load(rate_id).await?;
        actor.ensure_school_member(rate.school_id)?;

        let from = rate.status;
        rate.approve_by_school(actor.user_id, Utc::now())?;
        let rate = self.rates.update_transition(&rate, from).await?;

        log_transition(&rate, from, actor);
        Ok(rate)
    }

    pub async fn school_reject(&self, actor: &Actor, rate_id: Uuid, reason: &str) -> Result<FeeRate> {
        let mut rate = self.load(rate_id).await?;
        actor.ensure_school_member(rate.school_id)?;

        let from = rate.status;
        rate.reject_by_school(actor.user_id, reason, Utc::now())?;
        let rate = self.rates.update_transition(&rate, from).await?;

        log_transition(&rate, from, actor);
        Ok(rate)
    }

    /// Final approval; makes the rate active and expires the school's previous one
    ///
    /// # Errors
    /// * `InvalidState` - rate is not `pending_admin`
    /// * `Precondition` - school is not verified
    /// * `ConcurrentModification` - another approval won the race
    pub async fn admin_approve(&self, actor: &Actor, rate_id: Uuid) -> Result<Activation> {
        actor.ensure_platform_admin()?;
        let mut rate = self.load(rate_id).await?;
        rate.ensure_can(FeeRateEvent::AdminApprove)?;

        let verification = self
            .schools
            .verification_status(rate.school_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("School '{}' not found", rate.school_id)))?;

        if !verification.allows_fee_activation() {
            return Err(AppError::precondition(format!(
                "School '{}' must be verified before a fee rate can be activated (status: {})",
                rate.school_id, verification
            )));
        }

        let from = rate.status;
        rate.approve_by_admin(actor.user_id, Utc::now())?;
        let activation = self.rates.activate(&rate).await?;

        log_transition(&activation.rate, from, actor);
        if let Some(previous) = activation.superseded {
            info!(
                rate_id = %previous,
                school_id = %activation.rate.school_id,
                superseded_by = %activation.rate.id,
                from = %FeeRateStatus::Active,
                to = %FeeRateStatus::Expired,
                "Fee rate superseded"
            );
        }

        Ok(activation)
    }

    pub async fn admin_reject(&self, actor: &Actor, rate_id: Uuid, reason: &str) -> Result<FeeRate> {
        actor.ensure_platform_admin()?;
        let mut rate = self.load(rate_id).await?;

        let from = rate.status;
        rate.reject_by_admin(actor.user_id, reason, Utc::now())?;
        let rate = self.rates.update_transition(&rate, from).await?;

        log_transition(&rate, from, actor);
        Ok(rate)
    }

    pub async fn get(&self, actor: &Actor, rate_id: Uuid) -> Result<FeeRate> {
        let rate = self.load(rate_id).await?;
        actor.ensure_can_view_school(rate.school_id)?;
        Ok(rate)
    }

    /// Full audit history for a school, newest first
    pub async fn list_for_school(&self, actor: &Actor, school_id: Uuid) -> Result<Vec<FeeRate>> {
        actor.ensure_can_view_school(school_id)?;
        self.rates.list_by_school(school_id).await
    }

    /// Rates awaiting final approval, oldest first
    pub async fn list_pending_admin(&self, actor: &Actor) -> Result<Vec<FeeRate>> {
        self.list_by_status(actor, FeeRateStatus::PendingAdmin).await
    }

    pub async fn list_by_status(&self, actor: &Actor, status: FeeRateStatus) -> Result<Vec<FeeRate>> {
        actor.ensure_platform_admin()?;
        self.rates.list_by_status(status).await
    }

    /// School staff always see their own school. Platform admins see a school's
    /// history when `school_id` is given, otherwise the rates in `status`
    /// (the admin review queue by default).
    pub async fn list(
        &self,
        actor: &Actor,
        school_id: Option<Uuid>,
        status: Option<FeeRateStatus>,
    ) -> Result<Vec<FeeRate>> {
        let school_id = match school_id {
            Some(school_id) => Some(school_id),
            None if actor.role.is_platform_admin() => None,
            None => Some(
                actor
                    .school_id
                    .ok_or_else(|| AppError::forbidden("Caller is not attached to a school"))?,
            ),
        };

        match (school_id, status) {
            (Some(school_id), None) => self.list_for_school(actor, school_id).await,
            (Some(school_id), Some(status)) => Ok(self
                .list_for_school(actor, school_id)
                .await?
                .into_iter()
                .filter(|rate| rate.status == status)
                .collect()),
            (None, Some(status)) => self.list_by_status(actor, status).await,
            (None, None) => self.list_pending_admin(actor).await,
        }
    }

    /// The rate currently in effect for a school
    pub async fn active_rate(&self, actor: &Actor, school_id: Uuid) -> Result<Option<FeeRate>> {
        actor.ensure_can_view_school(school_id)?;
        self.rates.find_active(school_id).await
    }

    async fn load(&self, rate_id: Uuid) -> Result<FeeRate> {
        self.rates
            .find_by_id(rate_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Fee rate '{}' not found", rate_id)))
    }
}

fn log_transition(rate: &FeeRate, from: FeeRateStatus, actor: &Actor) {
    info!(
        rate_id = %rate.id,
        school_id = %rate.school_id,
        from = %from,
        to = %rate.status,
        actor = %actor.user_id,
        "Fee rate transition"
    );
}
