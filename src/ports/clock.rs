use chrono::{DateTime, Utc};

#[mockall::automock]
pub trait ClockPort {
    fn now(&self) -> DateTime<Utc>;
}
