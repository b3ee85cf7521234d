use std::{borrow::Cow, future::Future, pin::Pin, sync::Arc};

use tracing::warn;
use uuid::Uuid;

use crate::{
    config::Config,
    domain::{Profile, ReportingZone, ValidationError},
    ports::{database::ProfilePort, identity::IdentityPort},
};

pub mod activate_membership;
pub mod attendance_log;
pub mod create_member;
pub mod dashboard;
pub mod mark_attendance;
pub mod memberships;
pub mod notifications;
pub mod payments;
pub mod register_member;
pub mod trainers;

type ServiceFuture<T> = Pin<Box<dyn Future<Output = Result<T, Error>>>>;

/// Entry point for every use case
///
/// Each command is a [`tower::Service`] implemented on this type, generic over the record
/// store `D`, the identity collaborator `I`, the clock `C` and the push service `N`.
pub struct DomainLogic<D, I, C, N> {
    database: Arc<D>,
    identity: Arc<I>,
    clock: Arc<C>,
    notifier: Arc<N>,
    config: Arc<Config>,
    zone: ReportingZone,
}

impl<D, I, C, N> DomainLogic<D, I, C, N> {
    pub fn new(
        database: D,
        identity: I,
        clock: C,
        notifier: N,
        config: Config,
    ) -> Result<Self, Error> {
        let zone = config.reporting_zone()?;

        Ok(Self {
            database: Arc::new(database),
            identity: Arc::new(identity),
            clock: Arc::new(clock),
            notifier: Arc::new(notifier),
            config: Arc::new(config),
            zone,
        })
    }
}

impl<D, I, C, N> Clone for DomainLogic<D, I, C, N> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            identity: self.identity.clone(),
            clock: self.clock.clone(),
            notifier: self.notifier.clone(),
            config: self.config.clone(),
            zone: self.zone,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("member {0} is not allowed to perform this action")]
    Forbidden(Uuid),
    #[error("{0} not found")]
    NotFound(Cow<'static, str>),
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),
    /// The member never registered a device for push notifications
    #[error("member {0} has not enabled notifications")]
    NotificationsDisabled(Uuid),
    /// The service runs without the credentials this command needs
    #[error("service unavailable: {0}")]
    Unavailable(Cow<'static, str>),

    #[error("database port error: {0:?}")]
    Database(#[from] crate::ports::database::Error),
    #[error("identity port error: {0:?}")]
    Identity(crate::ports::identity::Error),
    #[error("notification port error: {0:?}")]
    Notification(#[from] crate::ports::notification::Error),
}

impl From<crate::ports::identity::Error> for Error {
    fn from(err: crate::ports::identity::Error) -> Self {
        match err {
            crate::ports::identity::Error::NotAuthenticated => Error::NotAuthenticated,
            err => Error::Identity(err),
        }
    }
}

/// Fail with `Unavailable` unless the privileged backend key is configured
fn require_credentials(config: &Config) -> Result<(), Error> {
    if config.service_credentials.is_present() {
        Ok(())
    } else {
        warn!("refusing privileged command: service credentials are not configured");
        Err(Error::Unavailable(
            "service credentials are not configured".into(),
        ))
    }
}

/// Resolve the session to a profile with the admin role
async fn authorize_admin<D, I>(database: &D, identity: &I, session: &str) -> Result<Profile, Error>
where
    D: ProfilePort,
    I: IdentityPort,
{
    let member_id = identity.authenticate(session).await?;
    match database.get_profile(member_id).await? {
        Some(profile) if profile.is_admin() => Ok(profile),
        _ => {
            warn!(%member_id, "refusing admin command for non-admin member");
            Err(Error::Forbidden(member_id))
        }
    }
}
