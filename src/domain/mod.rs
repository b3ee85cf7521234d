use std::borrow::Cow;

mod attendance;
mod membership;
mod notification;
mod payment;
mod profile;
mod stats;
mod trainer;

pub use attendance::{
    AttendanceRecord, AttendanceStatus, ReportingZone, Toggle, IST_OFFSET_MINUTES,
};
pub use membership::{Membership, MembershipStatus, MembershipTerm, Plan, EXPIRING_SOON_DAYS};
pub use notification::{Notification, PushSubscription, SubscriptionKeys};
pub use payment::{Payment, PaymentStatus, MANUAL_PAYMENT_ID};
pub use profile::{
    NewMember, NewMemberForm, Profile, Registration, RegistrationForm, Role, DEFAULT_AVATAR_URL,
};
pub use stats::DashboardStats;
pub use trainer::{NewTrainer, SocialLinks, Trainer, TrainerForm};

/// A request field that failed validation at the boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: Cow<'static, str>,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Parse an optional currency amount as entered in a form
///
/// Empty strings are treated as absent. Negative and non-finite amounts are rejected.
pub(crate) fn parse_amount(
    field: &'static str,
    input: Option<&str>,
) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = input.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let amount: f64 = raw
        .parse()
        .map_err(|_| ValidationError::new(field, format!("'{raw}' is not a number")))?;
    if !amount.is_finite() || amount < 0.0 {
        return Err(ValidationError::new(field, "must not be negative"));
    }
    Ok(Some(amount))
}
