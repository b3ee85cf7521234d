use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use uuid::Uuid;

use super::ValidationError;

/// Indian Standard Time, in minutes east of UTC
pub const IST_OFFSET_MINUTES: i32 = 5 * 60 + 30;

/// Time zone used to decide which calendar day a tap belongs to, and to display times
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReportingZone(FixedOffset);

impl ReportingZone {
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, ValidationError> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self)
            .ok_or_else(|| {
                ValidationError::new(
                    "reporting_offset_minutes",
                    format!("{minutes} is outside of a valid UTC offset"),
                )
            })
    }

    /// Calendar day of `instant` in this zone
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.0).date_naive()
    }

    /// Wall-clock time of `instant` in this zone, e.g. `06:00:00 PM`
    pub fn format_time(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.0)
            .format("%I:%M:%S %p")
            .to_string()
    }
}

impl Default for ReportingZone {
    fn default() -> Self {
        Self::from_offset_minutes(IST_OFFSET_MINUTES).unwrap_or(Self(Utc.fix()))
    }
}

/// One member's visit for one calendar day
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub member_id: Uuid,
    /// Calendar day in the reporting zone
    ///
    /// There is at most one record per `(member_id, date)`.
    pub date: NaiveDate,
    pub check_in_time: DateTime<Utc>,
    /// Unset until the member taps a second time on the same day
    pub check_out_time: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Open a new record for a member entering the gym
    pub fn check_in(member_id: Uuid, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            date,
            check_in_time: now,
            check_out_time: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.check_out_time.is_some()
    }
}

/// State transition to apply for a tap at the attendance terminal
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Toggle {
    /// No record for today yet
    CheckIn,
    /// Today's record is open and must be closed
    CheckOut(AttendanceRecord),
    /// Today's record is already closed, nothing to do
    AlreadyCompleted(AttendanceRecord),
}

impl Toggle {
    pub fn resolve(today: Option<AttendanceRecord>) -> Self {
        match today {
            None => Toggle::CheckIn,
            Some(record) if record.is_completed() => Toggle::AlreadyCompleted(record),
            Some(record) => Toggle::CheckOut(record),
        }
    }

    pub fn status(&self) -> AttendanceStatus {
        match self {
            Toggle::CheckIn => AttendanceStatus::CheckIn,
            Toggle::CheckOut(_) => AttendanceStatus::CheckOut,
            Toggle::AlreadyCompleted(_) => AttendanceStatus::AlreadyCompleted,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttendanceStatus {
    CheckIn,
    CheckOut,
    AlreadyCompleted,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::CheckIn => "CHECK_IN",
            AttendanceStatus::CheckOut => "CHECK_OUT",
            AttendanceStatus::AlreadyCompleted => "ALREADY_COMPLETED",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
