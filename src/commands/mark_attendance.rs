use std::task::{Context, Poll};

use chrono::{DateTime, NaiveDate, Utc};
use tower::Service;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{AttendanceRecord, AttendanceStatus, Toggle},
    ports::{
        clock::ClockPort,
        database::{self, AttendancePort, ProfilePort},
        identity::IdentityPort,
    },
};

use super::{DomainLogic, Error, ServiceFuture};

/// A member tapped the attendance terminal
pub struct MarkAttendanceRequest {
    pub session: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MarkAttendanceResponse {
    pub status: AttendanceStatus,
    /// Display name, if the member has a profile
    pub name: Option<String>,
    /// Time of this tap in the reporting zone, unset when nothing changed
    pub time: Option<String>,
    /// Today's record after the tap
    pub record: AttendanceRecord,
}

impl<D, I, C, N> Service<MarkAttendanceRequest> for DomainLogic<D, I, C, N>
where
    D: AttendancePort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = MarkAttendanceResponse;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: MarkAttendanceRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let zone = self.zone;
        Box::pin(async move {
            let member_id = identity.authenticate(&req.session).await?;
            let now = clock.now();
            let today = zone.date_of(now);

            let (status, record) = toggle_attendance(&*database, member_id, today, now)
                .await
                .map_err(|err| {
                    error!(%member_id, %today, error = %err, "failed to mark attendance");
                    err
                })?;
            info!(%member_id, %today, %status, "attendance marked");

            // The attendance change is already stored at this point
            let name = match database.get_profile(member_id).await {
                Ok(profile) => profile.map(|profile| profile.name),
                Err(err) => {
                    warn!(%member_id, error = %err, "could not load profile name");
                    None
                }
            };
            let time = match status {
                AttendanceStatus::AlreadyCompleted => None,
                AttendanceStatus::CheckIn => Some(zone.format_time(record.check_in_time)),
                AttendanceStatus::CheckOut => record.check_out_time.map(|at| zone.format_time(at)),
            };

            Ok(MarkAttendanceResponse {
                status,
                name,
                time,
                record,
            })
        })
    }
}

/// Apply at most one mutation for a tap by `member_id` on `today`
async fn toggle_attendance<D: AttendancePort>(
    database: &D,
    member_id: Uuid,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<(AttendanceStatus, AttendanceRecord), database::Error> {
    let toggle = Toggle::resolve(database.find_attendance(member_id, today).await?);
    let status = toggle.status();

    let record = match toggle {
        Toggle::CheckIn => {
            database
                .insert_attendance(AttendanceRecord::check_in(member_id, today, now))
                .await?
        }
        Toggle::CheckOut(record) => {
            // A clock reading behind the check-in never yields a negative visit
            let check_out_time = now.max(record.check_in_time);
            database.set_check_out(record.id, check_out_time).await?
        }
        Toggle::AlreadyCompleted(record) => record,
    };

    Ok((status, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::{
            clock::FixedClock, database::memory::MemoryDatabase, identity::memory::MemoryIdentity,
            notification::memory::MemoryOutbox,
        },
        commands::testing::{call, harness, morning},
        config::Config,
        domain::{Profile, PushSubscription, Role},
        ports::{clock::MockClockPort, database::MockAttendancePort, identity::MockIdentityPort},
    };
    use chrono::Duration;
    use mockall::predicate::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::BoxError;

    #[rstest]
    #[tokio::test]
    async fn test_check_in_out_completed() -> Result<(), BoxError> {
        // GIVEN a member named Asha
        let harness = harness();
        let (profile, session) = harness.sign_up("Asha", Role::Member).await;
        let mut domain = harness.domain.clone();

        // WHEN tapping at 09:00
        let res = call(
            &mut domain,
            MarkAttendanceRequest {
                session: session.clone(),
            },
        )
        .await?;

        // THEN the member is checked in
        assert_that!(res.status).is_equal_to(AttendanceStatus::CheckIn);
        assert_that!(res.name).is_equal_to(Some("Asha".to_string()));
        assert_that!(res.time).is_equal_to(Some("09:00:00 AM".to_string()));
        assert_that!(res.record.check_out_time).is_none();
        let check_in = res.record.clone();

        // WHEN tapping again at 18:00
        harness.clock.advance(Duration::hours(9));
        let res = call(
            &mut domain,
            MarkAttendanceRequest {
                session: session.clone(),
            },
        )
        .await?;

        // THEN the same record is checked out
        assert_that!(res.status).is_equal_to(AttendanceStatus::CheckOut);
        assert_that!(res.time).is_equal_to(Some("06:00:00 PM".to_string()));
        assert_that!(res.record.id).is_equal_to(check_in.id);
        assert_that!(res.record.check_out_time).is_equal_to(Some(morning() + Duration::hours(9)));
        assert_that!(res.record.check_out_time.unwrap()).is_greater_than(res.record.check_in_time);
        let checked_out = res.record.clone();

        // WHEN tapping a third and fourth time
        for _ in 0..2 {
            harness.clock.advance(Duration::minutes(30));
            let res = call(
                &mut domain,
                MarkAttendanceRequest {
                    session: session.clone(),
                },
            )
            .await?;

            // THEN nothing changes
            assert_that!(res.status).is_equal_to(AttendanceStatus::AlreadyCompleted);
            assert_that!(res.time).is_none();
            assert_that!(res.record).is_equal_to(checked_out.clone());
        }

        // AND only one record exists for the day
        let records = harness.database.attendance_on(check_in.date).await?;
        assert_that!(records).has_length(1);
        assert_that!(records[0].member_id).is_equal_to(profile.id);

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_clock_behind_check_in() -> Result<(), BoxError> {
        // GIVEN a member checked in at 09:00
        let harness = harness();
        let (_, session) = harness.sign_up("Asha", Role::Member).await;
        let mut domain = harness.domain.clone();
        let res = call(
            &mut domain,
            MarkAttendanceRequest {
                session: session.clone(),
            },
        )
        .await?;
        let check_in_time = res.record.check_in_time;

        // WHEN the clock reads five minutes earlier on the next tap
        harness.clock.advance(Duration::minutes(-5));
        let res = call(&mut domain, MarkAttendanceRequest { session }).await?;

        // THEN the check-out is stored at the check-in instant, not before it
        assert_that!(res.status).is_equal_to(AttendanceStatus::CheckOut);
        assert_that!(res.record.check_out_time).is_equal_to(Some(check_in_time));
        assert_that!(res.time).is_equal_to(Some("09:00:00 AM".to_string()));
        let stored = harness
            .database
            .find_attendance(res.record.member_id, res.record.date)
            .await?;
        assert_that!(stored.and_then(|record| record.check_out_time))
            .is_equal_to(Some(check_in_time));

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_next_day_checks_in_again() -> Result<(), BoxError> {
        let harness = harness();
        let (_, session) = harness.sign_up("Asha", Role::Member).await;
        let mut domain = harness.domain.clone();
        for _ in 0..2 {
            call(
                &mut domain,
                MarkAttendanceRequest {
                    session: session.clone(),
                },
            )
            .await?;
        }

        harness.clock.advance(Duration::days(1));
        let res = call(&mut domain, MarkAttendanceRequest { session }).await?;

        assert_that!(res.status).is_equal_to(AttendanceStatus::CheckIn);
        assert_that!(res.record.date).is_equal_to(NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_member_without_profile() -> Result<(), BoxError> {
        // GIVEN an account that never completed its profile
        let harness = harness();
        let member_id = harness
            .identity
            .create_account(crate::ports::identity::NewAccount {
                email: "ghost@example.com".to_string(),
                password: "secret1".to_string(),
                name: "Ghost".to_string(),
            })
            .await?;
        let session = harness.identity.sign_in("ghost@example.com", "secret1")?;

        let res = call(&mut harness.domain.clone(), MarkAttendanceRequest { session }).await?;

        assert_that!(res.status).is_equal_to(AttendanceStatus::CheckIn);
        assert_that!(res.name).is_none();
        assert_that!(res.record.member_id).is_equal_to(member_id);

        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_not_authenticated() {
        // GIVEN an identity port that rejects the session and a clock that must not be read
        let mut identity = MockIdentityPort::new();
        identity
            .expect_authenticate()
            .times(1)
            .returning(|_| Err(crate::ports::identity::Error::NotAuthenticated));
        let mut clock = MockClockPort::new();
        clock.expect_now().never();

        let mut domain = DomainLogic::new(
            MemoryDatabase::default(),
            identity,
            clock,
            MemoryOutbox::default(),
            Config::default(),
        )
        .unwrap();

        let res = call(
            &mut domain,
            MarkAttendanceRequest {
                session: "expired".to_string(),
            },
        )
        .await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::NotAuthenticated));
        Arc::into_inner(domain.clock).unwrap().checkpoint();
    }

    /// Store whose attendance table is unreachable
    struct UnreachableStore {
        attendance: MockAttendancePort,
        profiles: MemoryDatabase,
    }

    #[async_trait::async_trait]
    impl AttendancePort for UnreachableStore {
        async fn find_attendance(
            &self,
            member_id: Uuid,
            date: NaiveDate,
        ) -> Result<Option<AttendanceRecord>, database::Error> {
            self.attendance.find_attendance(member_id, date).await
        }
        async fn insert_attendance(
            &self,
            record: AttendanceRecord,
        ) -> Result<AttendanceRecord, database::Error> {
            self.attendance.insert_attendance(record).await
        }
        async fn set_check_out(
            &self,
            record_id: Uuid,
            check_out_time: DateTime<Utc>,
        ) -> Result<AttendanceRecord, database::Error> {
            self.attendance.set_check_out(record_id, check_out_time).await
        }
        async fn attendance_on(
            &self,
            date: NaiveDate,
        ) -> Result<Vec<AttendanceRecord>, database::Error> {
            self.attendance.attendance_on(date).await
        }
        async fn recent_attendance(
            &self,
            limit: usize,
        ) -> Result<Vec<AttendanceRecord>, database::Error> {
            self.attendance.recent_attendance(limit).await
        }
    }

    #[async_trait::async_trait]
    impl ProfilePort for UnreachableStore {
        async fn get_profile(&self, member_id: Uuid) -> Result<Option<Profile>, database::Error> {
            self.profiles.get_profile(member_id).await
        }
        async fn insert_profile(&self, profile: Profile) -> Result<Profile, database::Error> {
            self.profiles.insert_profile(profile).await
        }
        async fn set_subscription(
            &self,
            member_id: Uuid,
            subscription: PushSubscription,
        ) -> Result<Profile, database::Error> {
            self.profiles.set_subscription(member_id, subscription).await
        }
        async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, database::Error> {
            self.profiles.list_profiles(role).await
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct ConnectionRefused;

    #[rstest]
    #[tokio::test]
    async fn test_store_failure() {
        // GIVEN a store that fails on lookup and must not be written to
        let identity = MemoryIdentity::default();
        let member_id = identity
            .create_account(crate::ports::identity::NewAccount {
                email: "asha@example.com".to_string(),
                password: "secret1".to_string(),
                name: "Asha".to_string(),
            })
            .await
            .unwrap();
        let session = identity.sign_in("asha@example.com", "secret1").unwrap();

        let mut attendance = MockAttendancePort::new();
        attendance
            .expect_find_attendance()
            .times(1)
            .with(eq(member_id), eq(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
            .returning(|_, _| Err(database::Error::Adapter(Box::new(ConnectionRefused))));
        attendance.expect_insert_attendance().never();
        attendance.expect_set_check_out().never();

        let mut domain = DomainLogic::new(
            UnreachableStore {
                attendance,
                profiles: MemoryDatabase::default(),
            },
            identity,
            FixedClock::new(morning()),
            MemoryOutbox::default(),
            Config::default(),
        )
        .unwrap();

        // WHEN tapping
        let res = call(&mut domain, MarkAttendanceRequest { session }).await;

        // THEN the store failure is reported
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Database(database::Error::Adapter(_))));
        Arc::into_inner(domain.database)
            .unwrap()
            .attendance
            .checkpoint();
    }
}
