use crate::{
    domain::{AttendanceRecord, Membership, Payment, Profile, PushSubscription, Role, Trainer},
    ports::database::{
        AttendancePort, Error, MembershipPort, PaymentPort, ProfilePort, TrainerPort,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    /// Keyed by `(member_id, date)`, which enforces one record per member per day
    attendance: HashMap<(Uuid, NaiveDate), AttendanceRecord>,
    /// Keyed by `member_id`
    memberships: HashMap<Uuid, Membership>,
    profiles: HashMap<Uuid, Profile>,
    payments: Vec<Payment>,
    trainers: HashMap<Uuid, Trainer>,
}

#[derive(Clone, Debug)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
}

#[async_trait::async_trait]
impl AttendancePort for MemoryDatabase {
    async fn find_attendance(
        &self,
        member_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, Error> {
        let record = self
            .tables
            .lock()?
            .attendance
            .get(&(member_id, date))
            .cloned();

        Ok(record)
    }

    async fn insert_attendance(
        &self,
        record: AttendanceRecord,
    ) -> Result<AttendanceRecord, Error> {
        match self
            .tables
            .lock()?
            .attendance
            .entry((record.member_id, record.date))
        {
            // Member already tapped today
            Entry::Occupied(_) => Err(Error::DuplicateAttendance {
                member_id: record.member_id,
                date: record.date,
            }),
            Entry::Vacant(entry) => Ok(entry.insert(record).clone()),
        }
    }

    async fn set_check_out(
        &self,
        record_id: Uuid,
        check_out_time: DateTime<Utc>,
    ) -> Result<AttendanceRecord, Error> {
        let mut tables = self.tables.lock()?;
        let record = tables
            .attendance
            .values_mut()
            .find(|record| record.id == record_id)
            .ok_or(Error::RecordNotFound(record_id))?;

        record.check_out_time = Some(check_out_time);
        Ok(record.clone())
    }

    async fn attendance_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, Error> {
        let mut records: Vec<_> = self
            .tables
            .lock()?
            .attendance
            .values()
            .filter(|record| record.date == date)
            .cloned()
            .collect();

        records.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        Ok(records)
    }

    async fn recent_attendance(&self, limit: usize) -> Result<Vec<AttendanceRecord>, Error> {
        let mut records: Vec<_> = self
            .tables
            .lock()?
            .attendance
            .values()
            .cloned()
            .collect();

        records.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        records.truncate(limit);
        Ok(records)
    }
}

#[async_trait::async_trait]
impl MembershipPort for MemoryDatabase {
    async fn get_membership(&self, member_id: Uuid) -> Result<Option<Membership>, Error> {
        let membership = self.tables.lock()?.memberships.get(&member_id).cloned();

        Ok(membership)
    }

    async fn save_membership(&self, membership: Membership) -> Result<Membership, Error> {
        self.tables
            .lock()?
            .memberships
            .insert(membership.member_id, membership.clone());

        Ok(membership)
    }
}

#[async_trait::async_trait]
impl ProfilePort for MemoryDatabase {
    async fn get_profile(&self, member_id: Uuid) -> Result<Option<Profile>, Error> {
        let profile = self.tables.lock()?.profiles.get(&member_id).cloned();

        Ok(profile)
    }

    async fn insert_profile(&self, profile: Profile) -> Result<Profile, Error> {
        match self.tables.lock()?.profiles.entry(profile.id) {
            Entry::Occupied(_) => Err(Error::DuplicateRecord(profile.id)),
            Entry::Vacant(entry) => Ok(entry.insert(profile).clone()),
        }
    }

    async fn set_subscription(
        &self,
        member_id: Uuid,
        subscription: PushSubscription,
    ) -> Result<Profile, Error> {
        let mut tables = self.tables.lock()?;
        let profile = tables
            .profiles
            .get_mut(&member_id)
            .ok_or(Error::RecordNotFound(member_id))?;

        profile.subscription = Some(subscription);
        Ok(profile.clone())
    }

    async fn list_profiles(&self, role: Role) -> Result<Vec<Profile>, Error> {
        let mut profiles: Vec<_> = self
            .tables
            .lock()?
            .profiles
            .values()
            .filter(|profile| profile.role == role)
            .cloned()
            .collect();

        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }
}

#[async_trait::async_trait]
impl PaymentPort for MemoryDatabase {
    async fn record_payment(&self, payment: Payment) -> Result<Payment, Error> {
        self.tables.lock()?.payments.push(payment.clone());

        Ok(payment)
    }

    async fn recent_payments(&self, limit: usize) -> Result<Vec<Payment>, Error> {
        let mut payments = self.tables.lock()?.payments.clone();

        payments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        payments.truncate(limit);
        Ok(payments)
    }
}

#[async_trait::async_trait]
impl TrainerPort for MemoryDatabase {
    async fn list_trainers(&self) -> Result<Vec<Trainer>, Error> {
        let mut trainers: Vec<_> = self.tables.lock()?.trainers.values().cloned().collect();

        trainers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trainers)
    }

    async fn insert_trainer(&self, trainer: Trainer) -> Result<Trainer, Error> {
        match self.tables.lock()?.trainers.entry(trainer.id) {
            Entry::Occupied(_) => Err(Error::DuplicateRecord(trainer.id)),
            Entry::Vacant(entry) => Ok(entry.insert(trainer).clone()),
        }
    }

    async fn delete_trainer(&self, trainer_id: Uuid) -> Result<(), Error> {
        self.tables
            .lock()?
            .trainers
            .remove(&trainer_id)
            .map(|_| ())
            .ok_or(Error::RecordNotFound(trainer_id))
    }
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
        }
    }
}

/// Erased [`PoisonError`]
///
/// `PoisonError` keeps the `MutexGuard` internally, which is not send. Thus we erase the error
/// and only keep the string representation instead.
#[derive(Debug, thiserror::Error)]
#[error("poison error: {0}")]
pub struct ErasedPoisonError(pub(crate) String);

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
