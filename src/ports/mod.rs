pub mod clock;
pub mod database;
pub mod identity;
pub mod notification;
