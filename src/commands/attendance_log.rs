use std::{
    collections::HashMap,
    task::{Context, Poll},
};

use tower::Service;
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::{AttendanceRecord, Profile},
    ports::{
        clock::ClockPort,
        database::{AttendancePort, ProfilePort},
        identity::IdentityPort,
    },
};

use super::{authorize_admin, require_credentials, DomainLogic, Error, ServiceFuture};

/// Today's check-ins, for the front desk
pub struct TodaysLogRequest {
    pub session: String,
}

/// Most recent check-ins across all days
pub struct AttendanceHistoryRequest {
    pub session: String,
}

/// Attendance record joined with the member's profile
#[derive(Clone, Debug, PartialEq)]
pub struct AttendanceEntry {
    pub record: AttendanceRecord,
    pub name: Option<String>,
    pub photo: Option<String>,
}

impl<D, I, C, N> Service<TodaysLogRequest> for DomainLogic<D, I, C, N>
where
    D: AttendancePort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = Vec<AttendanceEntry>;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: TodaysLogRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let zone = self.zone;
        Box::pin(async move {
            authorize_admin(&*database, &*identity, &req.session).await?;

            let today = zone.date_of(clock.now());
            let records = database.attendance_on(today).await?;
            debug!(%today, count = records.len(), "loaded today's attendance");

            with_profiles(&*database, records).await
        })
    }
}

impl<D, I, C, N> Service<AttendanceHistoryRequest> for DomainLogic<D, I, C, N>
where
    D: AttendancePort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = Vec<AttendanceEntry>;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: AttendanceHistoryRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            authorize_admin(&*database, &*identity, &req.session).await?;

            let records = database
                .recent_attendance(config.attendance_history_limit)
                .await?;

            with_profiles(&*database, records).await
        })
    }
}

/// Join each record with its member's profile, looking up every member once
async fn with_profiles<D: ProfilePort>(
    database: &D,
    records: Vec<AttendanceRecord>,
) -> Result<Vec<AttendanceEntry>, Error> {
    let mut profiles: HashMap<Uuid, Option<Profile>> = HashMap::new();
    let mut entries = Vec::with_capacity(records.len());

    for record in records {
        if !profiles.contains_key(&record.member_id) {
            let profile = database.get_profile(record.member_id).await?;
            profiles.insert(record.member_id, profile);
        }
        let profile = profiles.get(&record.member_id).and_then(Option::as_ref);

        entries.push(AttendanceEntry {
            name: profile.map(|profile| profile.name.clone()),
            photo: profile.map(|profile| profile.photo.clone()),
            record,
        });
    }

    Ok(entries)
}
