use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{money, AppError, Result};

/// Longest rejection reason we keep
pub const MAX_REASON_LENGTH: usize = 1000;

/// Fee rate lifecycle status
///
/// `pending_school → pending_admin → active`, with rejection exits from each
/// pending state and `expired` applied to an active rate when it is superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FeeRateStatus {
    PendingSchool,
    PendingAdmin,
    Active,
    RejectedBySchool,
    RejectedByAdmin,
    Expired,
}

/// Events that drive a fee rate through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeeRateEvent {
    SchoolApprove,
    SchoolReject,
    AdminApprove,
    AdminReject,
    Supersede,
}

impl FeeRateStatus {
    pub const ALL: [FeeRateStatus; 6] = [
        FeeRateStatus::PendingSchool,
        FeeRateStatus::PendingAdmin,
        FeeRateStatus::Active,
        FeeRateStatus::RejectedBySchool,
        FeeRateStatus::RejectedByAdmin,
        FeeRateStatus::Expired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingSchool => "pending_school",
            Self::PendingAdmin => "pending_admin",
            Self::Active => "active",
            Self::RejectedBySchool => "rejected_by_school",
            Self::RejectedByAdmin => "rejected_by_admin",
            Self::Expired => "expired",
        }
    }

    /// Transition table: the status reached by applying `event`, or `None` if illegal
    pub fn next(self, event: FeeRateEvent) -> Option<FeeRateStatus> {
        use FeeRateEvent::*;

        match self {
            Self::PendingSchool => match event {
                SchoolApprove => Some(Self::PendingAdmin),
                SchoolReject => Some(Self::RejectedBySchool),
                AdminApprove | AdminReject | Supersede => None,
            },
            Self::PendingAdmin => match event {
                AdminApprove => Some(Self::Active),
                AdminReject => Some(Self::RejectedByAdmin),
                SchoolApprove | SchoolReject | Supersede => None,
            },
            Self::Active => match event {
                Supersede => Some(Self::Expired),
                SchoolApprove | SchoolReject | AdminApprove | AdminReject => None,
            },
            Self::RejectedBySchool | Self::RejectedByAdmin | Self::Expired => None,
        }
    }

    /// Like [`next`](Self::next) but reports an illegal transition as `InvalidState`
    pub fn apply(self, event: FeeRateEvent) -> Result<FeeRateStatus> {
        self.next(event).ok_or_else(|| {
            AppError::invalid_state(
                self,
                format!("Cannot {} a fee rate that is {}", event, self),
            )
        })
    }

    /// No transition leaves a terminal status (an active rate only leaves by supersession)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RejectedBySchool | Self::RejectedByAdmin | Self::Expired
        )
    }
}

impl std::fmt::Display for FeeRateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FeeRateStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid fee rate status: {}", s))
    }
}

impl std::fmt::Display for FeeRateEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Self::SchoolApprove => "school-approve",
            Self::SchoolReject => "school-reject",
            Self::AdminApprove => "admin-approve",
            Self::AdminReject => "admin-reject",
            Self::Supersede => "supersede",
        };
        write!(f, "{}", verb)
    }
}

/// A platform service-fee percentage for one school, subject to dual approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FeeRate {
    pub id: Uuid,
    pub school_id: Uuid,
    pub fee_percentage: Decimal,
    pub status: FeeRateStatus,
    pub proposed_by: Uuid,
    pub school_approved_by: Option<Uuid>,
    pub school_approved_at: Option<DateTime<Utc>>,
    pub admin_approved_by: Option<Uuid>,
    pub admin_approved_at: Option<DateTime<Utc>>,
    pub rejected_by: Option<Uuid>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    /// Set when the rate becomes active
    pub effective_from: Option<DateTime<Utc>>,
    /// `None` while open-ended
    pub effective_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeeRate {
    /// Create a new proposal in `pending_school`
    ///
    /// # Errors
    /// * `Validation` - percentage outside [0, 100]
    pub fn propose(
        school_id: Uuid,
        fee_percentage: Decimal,
        proposed_by: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let fee_percentage = money::validate_percentage(fee_percentage)?;

        Ok(Self {
            id: Uuid::new_v4(),
            school_id,
            fee_percentage,
            status: FeeRateStatus::PendingSchool,
            proposed_by,
            school_approved_by: None,
            school_approved_at: None,
            admin_approved_by: None,
            admin_approved_at: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            effective_from: None,
            effective_until: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check that `event` is legal from the current status without changing anything
    pub fn ensure_can(&self, event: FeeRateEvent) -> Result<()> {
        self.status.apply(event).map(|_| ())
    }

    /// School approval; the proposer can never approve their own proposal
    pub fn approve_by_school(&mut self, approver: Uuid, at: DateTime<Utc>) -> Result<()> {
        if approver == self.proposed_by {
            return Err(AppError::forbidden(
                "A fee rate cannot be approved by the person who proposed it",
            ));
        }

        self.status = self.status.apply(FeeRateEvent::SchoolApprove)?;
        self.school_approved_by = Some(approver);
        self.school_approved_at = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn reject_by_school(&mut self, rejector: Uuid, reason: &str, at: DateTime<Utc>) -> Result<()> {
        let reason = normalize_reason(reason)?;
        self.status = self.status.apply(FeeRateEvent::SchoolReject)?;
        self.stamp_rejection(rejector, reason, at);
        Ok(())
    }

    /// Admin approval; the rate becomes effective at `at`
    ///
    /// Closing out the previously active rate is the store's job and happens in the
    /// same unit of work as persisting this change.
    pub fn approve_by_admin(&mut self, approver: Uuid, at: DateTime<Utc>) -> Result<()> {
        let next = self.status.apply(FeeRateEvent::AdminApprove)?;

        if self.school_approved_at.is_none() {
            return Err(AppError::invalid_state(
                self.status,
                "Fee rate has no recorded school approval",
            ));
        }

        self.status = next;
        self.admin_approved_by = Some(approver);
        self.admin_approved_at = Some(at);
        self.effective_from = Some(at);
        self.effective_until = None;
        self.updated_at = at;
        Ok(())
    }

    pub fn reject_by_admin(&mut self, rejector: Uuid, reason: &str, at: DateTime<Utc>) -> Result<()> {
        let reason = normalize_reason(reason)?;
        self.status = self.status.apply(FeeRateEvent::AdminReject)?;
        self.stamp_rejection(rejector, reason, at);
        Ok(())
    }

    /// Close out an active rate that a newer one replaces
    pub fn supersede(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.status = self.status.apply(FeeRateEvent::Supersede)?;
        self.effective_until = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == FeeRateStatus::Active
    }

    fn stamp_rejection(&mut self, rejector: Uuid, reason: String, at: DateTime<Utc>) {
        self.rejected_by = Some(rejector);
        self.rejected_at = Some(at);
        self.rejection_reason = Some(reason);
        self.updated_at = at;
    }
}

/// Rejection reasons are mandatory and shown to the proposer
pub fn normalize_reason(reason: &str) -> Result<String> {
    let reason = reason.trim();

    if reason.is_empty() {
        return Err(AppError::validation("A rejection reason is required"));
    }

    if reason.chars().count() > MAX_REASON_LENGTH {
        return Err(AppError::validation(format!(
            "Rejection reason cannot exceed {} characters",
            MAX_REASON_LENGTH
        )));
    }

    Ok(reason.to_string())
}

/// Body of `POST /fee-rates`
#[derive(Debug, Clone, Deserialize)]
pub struct ProposeFeeRateRequest {
    #[serde(alias = "percentage")]
    pub fee_percentage: Decimal,
    /// Must match the caller's school when present
    #[serde(default)]
    pub school_id: Option<Uuid>,
}

/// Body of the reject endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct RejectFeeRateRequest {
    #[serde(default)]
    pub reason: String,
}
