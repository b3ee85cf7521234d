use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Months, Utc};
use uuid::Uuid;

use super::ValidationError;

/// Memberships ending within this many days are due a fee reminder
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// Membership tier sold by the gym
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Plan {
    Basic,
    Pro,
    Elite,
}

impl Plan {
    /// Length of the membership term in calendar months
    pub fn months(&self) -> u32 {
        match self {
            Plan::Basic => 3,
            Plan::Pro => 6,
            Plan::Elite => 12,
        }
    }

    /// List price in rupees
    pub fn price(&self) -> f64 {
        match self {
            Plan::Basic => 3000.0,
            Plan::Pro => 4500.0,
            Plan::Elite => 6500.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Basic => "BASIC",
            Plan::Pro => "PRO",
            Plan::Elite => "ELITE",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "BASIC" => Ok(Plan::Basic),
            "PRO" => Ok(Plan::Pro),
            "ELITE" => Ok(Plan::Elite),
            legacy @ ("MONTHLY" | "QUARTERLY" | "YEARLY") => Err(ValidationError::new(
                "plan",
                format!("{legacy} is no longer offered, use BASIC, PRO or ELITE"),
            )),
            other => Err(ValidationError::new(
                "plan",
                format!("unknown plan '{other}'"),
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipStatus {
    Active,
    Expired,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Active => "ACTIVE",
            MembershipStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concrete dates and price for a plan
#[derive(Clone, Debug, PartialEq)]
pub struct MembershipTerm {
    pub plan: Plan,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub amount: f64,
}

impl MembershipTerm {
    /// Derive the term for `plan` starting at `start_date`
    ///
    /// A nonzero `amount` overrides the list price, e.g. when digitising historical paper
    /// records where the member paid a negotiated fee. The end date is clamped to the last day
    /// of the month when the start day does not exist in the target month.
    pub fn calculate(
        plan: Plan,
        start_date: DateTime<Utc>,
        amount: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let amount = amount
            .filter(|amount| *amount != 0.0)
            .unwrap_or_else(|| plan.price());
        let end_date = start_date
            .checked_add_months(Months::new(plan.months()))
            .ok_or_else(|| ValidationError::new("start_date", "term ends out of range"))?;

        Ok(Self {
            plan,
            start_date,
            end_date,
            amount,
        })
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> MembershipStatus {
        status_at(self.end_date, now)
    }
}

fn status_at(end_date: DateTime<Utc>, now: DateTime<Utc>) -> MembershipStatus {
    if end_date > now {
        MembershipStatus::Active
    } else {
        MembershipStatus::Expired
    }
}

/// A member's current membership
///
/// The status is not stored: it is derived from `end_date` whenever it is read, so a stored
/// membership can never claim to be active after its end date.
#[derive(Clone, Debug, PartialEq)]
pub struct Membership {
    pub id: Uuid,
    pub member_id: Uuid,
    pub plan: Plan,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Amount paid, in rupees
    pub amount: f64,
}

impl Membership {
    pub fn new(member_id: Uuid, term: MembershipTerm) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            plan: term.plan,
            start_date: term.start_date,
            end_date: term.end_date,
            amount: term.amount,
        }
    }

    /// Replace the term in place, keeping the membership identity
    pub fn renew(&mut self, term: MembershipTerm) {
        self.plan = term.plan;
        self.start_date = term.start_date;
        self.end_date = term.end_date;
        self.amount = term.amount;
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> MembershipStatus {
        status_at(self.end_date, now)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status_at(now) == MembershipStatus::Active
    }

    /// Active now, but ending before `now + window`
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.is_active(now) && self.end_date < now + window
    }

    pub fn expires_soon(&self, now: DateTime<Utc>) -> bool {
        self.expires_within(now, Duration::days(EXPIRING_SOON_DAYS))
    }
}
