use std::task::{Context, Poll};

use tower::Service;
use tracing::debug;

use crate::{
    domain::{DashboardStats, Role},
    ports::{
        clock::ClockPort,
        database::{AttendancePort, MembershipPort, PaymentPort, ProfilePort},
        identity::IdentityPort,
    },
};

use super::{authorize_admin, require_credentials, DomainLogic, Error, ServiceFuture};

pub struct DashboardStatsRequest {
    pub session: String,
}

impl<D, I, C, N> Service<DashboardStatsRequest> for DomainLogic<D, I, C, N>
where
    D: AttendancePort + MembershipPort + PaymentPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = DashboardStats;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DashboardStatsRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let config = self.config.clone();
        let zone = self.zone;
        Box::pin(async move {
            require_credentials(&config)?;
            authorize_admin(&*database, &*identity, &req.session).await?;

            let mut memberships = Vec::new();
            for profile in database.list_profiles(Role::Member).await? {
                if let Some(membership) = database.get_membership(profile.id).await? {
                    memberships.push(membership);
                }
            }
            let attendance = database
                .recent_attendance(config.attendance_history_limit)
                .await?;
            let payments = database
                .recent_payments(config.payment_history_limit)
                .await?;

            let stats =
                DashboardStats::compute(&memberships, &attendance, &payments, clock.now(), zone);
            debug!(?stats, "computed dashboard stats");

            Ok(stats)
        })
    }
}
