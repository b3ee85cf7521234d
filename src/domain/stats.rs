use chrono::{DateTime, Duration, Utc};

use super::{AttendanceRecord, Membership, Payment, ReportingZone};

/// Members counted as "in the gym" if they checked in this many hours ago or less
const ACTIVE_NOW_HOURS: i64 = 2;

/// Headline numbers for the admin dashboard
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardStats {
    pub total_members: usize,
    pub active_now: usize,
    pub expiring_soon: usize,
    /// Rupees received today, in the reporting zone
    pub today_revenue: f64,
}

impl DashboardStats {
    pub fn compute(
        memberships: &[Membership],
        attendance: &[AttendanceRecord],
        payments: &[Payment],
        now: DateTime<Utc>,
        zone: ReportingZone,
    ) -> Self {
        let today = zone.date_of(now);
        let active_since = now - Duration::hours(ACTIVE_NOW_HOURS);

        Self {
            total_members: memberships.len(),
            active_now: attendance
                .iter()
                .filter(|record| record.check_in_time > active_since)
                .count(),
            expiring_soon: memberships
                .iter()
                .filter(|membership| membership.expires_soon(now))
                .count(),
            today_revenue: payments
                .iter()
                .filter(|payment| zone.date_of(payment.created_at) == today)
                .map(|payment| payment.amount)
                .sum(),
        }
    }
}
