use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::{
    AttendanceRecord, Membership, Payment, Profile, PushSubscription, Role, Trainer,
};

#[mockall::automock]
#[async_trait::async_trait]
pub trait AttendancePort {
    /// Today's record for a member, if they already tapped
    async fn find_attendance(
        &self,
        member_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, Error>;
    async fn insert_attendance(&self, record: AttendanceRecord)
        -> Result<AttendanceRecord, Error>;
    async fn set_check_out(
        &self,
        record_id: Uuid,
        check_out_time: DateTime<Utc>,
    ) -> Result<AttendanceRecord, Error>;
    /// All records for a day, latest check-in first
    async fn attendance_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, Error>;
    /// Most recent records across all days, latest check-in first
    async fn recent_attendance(&self, limit: usize) -> Result<Vec<AttendanceRecord>, Error>;
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait MembershipPort {
    async fn get_membership(&self, member_id: Uuid) -> Result<Option<Membership>, Error>;
    /// Insert the membership, or replace the stored one with the same id
    async fn save_membership(&self, membership: Membership) -> Result<Membership, Error>;
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait ProfilePort {
    async fn get_profile(&self, member_id: Uuid) -> Result<Option<Profile>, Error>;
    async fn insert_profile(&self, profile: Profile) -> Result<Profile, Error>;
    /// Replace the member's push subscription
    async fn set_subscription(
        &self,
        member_id: Uuid,
        subscription: PushSubscription,
    ) -> Result<Profile, Error>;
    /// Profiles with the given role, newest first
    async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, Error>;
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait PaymentPort {
    async fn record_payment(&self, payment: Payment) -> Result<Payment, Error>;
    /// Most recent payments, newest first
    async fn recent_payments(&self, limit: usize) -> Result<Vec<Payment>, Error>;
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait TrainerPort {
    /// Trainers, newest first
    async fn list_trainers(&self) -> Result<Vec<Trainer>, Error>;
    async fn insert_trainer(&self, trainer: Trainer) -> Result<Trainer, Error>;
    async fn delete_trainer(&self, trainer_id: Uuid) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A member already has an attendance record for this day
    ///
    /// Stores must enforce at most one record per `(member_id, date)`, since two simultaneous
    /// taps can both observe "no record yet".
    #[error("attendance for member {member_id} on {date} already exists")]
    DuplicateAttendance { member_id: Uuid, date: NaiveDate },

    /// A record addressed by id does not exist
    #[error("record {0} does not exist")]
    RecordNotFound(Uuid),

    /// A record with the same identifier already exists
    #[error("record {0} already exists")]
    DuplicateRecord(Uuid),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
