use std::task::{Context, Poll};

use tower::Service;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{Notification, Profile, PushSubscription, Role},
    ports::{
        clock::ClockPort,
        database::{self, MembershipPort, ProfilePort},
        identity::IdentityPort,
        notification::NotificationPort,
    },
};

use super::{authorize_admin, require_credentials, DomainLogic, Error, ServiceFuture};

/// A member enables push notifications on their device
pub struct SaveSubscriptionRequest {
    pub session: String,
    /// Subscription JSON as produced by the browser
    pub subscription: String,
}

/// An admin reminds one member that their membership is ending
pub struct SendFeeReminderRequest {
    pub session: String,
    pub member_id: Uuid,
}

/// An admin reminds every member whose membership ends within the week
pub struct SendFeeRemindersRequest {
    pub session: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeReminderReport {
    pub reminded: Vec<Uuid>,
    /// Members with an expiring membership but no push subscription
    pub not_enabled: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

impl<D, I, C, N> Service<SaveSubscriptionRequest> for DomainLogic<D, I, C, N>
where
    D: ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = ();
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SaveSubscriptionRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            let member_id = identity.authenticate(&req.session).await?;
            let subscription = PushSubscription::parse(&req.subscription)?;

            match database.set_subscription(member_id, subscription).await {
                Ok(_) => {
                    info!(%member_id, "push subscription saved");
                    Ok(())
                }
                Err(database::Error::RecordNotFound(_)) => Err(Error::NotFound(
                    format!("profile for member {member_id}").into(),
                )),
                Err(err) => Err(err.into()),
            }
        })
    }
}

impl<D, I, C, N> Service<SendFeeReminderRequest> for DomainLogic<D, I, C, N>
where
    D: ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
    N: NotificationPort + 'static,
{
    type Response = ();
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SendFeeReminderRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let notifier = self.notifier.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            authorize_admin(&*database, &*identity, &req.session).await?;

            let member_id = req.member_id;
            let profile = database
                .get_profile(member_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("profile for member {member_id}").into()))?;

            send_fee_reminder(&*notifier, &profile).await
        })
    }
}

impl<D, I, C, N> Service<SendFeeRemindersRequest> for DomainLogic<D, I, C, N>
where
    D: MembershipPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
    N: NotificationPort + 'static,
{
    type Response = FeeReminderReport;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: SendFeeRemindersRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let notifier = self.notifier.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            authorize_admin(&*database, &*identity, &req.session).await?;

            let now = clock.now();
            let mut report = FeeReminderReport::default();
            for profile in database.list_profiles(Role::Member).await? {
                let expiring = database
                    .get_membership(profile.id)
                    .await?
                    .is_some_and(|membership| membership.expires_soon(now));
                if !expiring {
                    continue;
                }

                match send_fee_reminder(&*notifier, &profile).await {
                    Ok(()) => report.reminded.push(profile.id),
                    Err(Error::NotificationsDisabled(id)) => report.not_enabled.push(id),
                    // One unreachable device does not stop the batch
                    Err(_) => report.failed.push(profile.id),
                }
            }
            info!(
                reminded = report.reminded.len(),
                not_enabled = report.not_enabled.len(),
                failed = report.failed.len(),
                "fee reminders sent"
            );

            Ok(report)
        })
    }
}

/// Push the fee reminder to the member's device
async fn send_fee_reminder<N: NotificationPort>(
    notifier: &N,
    profile: &Profile,
) -> Result<(), Error> {
    let member_id = profile.id;
    let Some(subscription) = &profile.subscription else {
        warn!(%member_id, "member has not enabled notifications");
        return Err(Error::NotificationsDisabled(member_id));
    };

    notifier
        .send(subscription, &Notification::fee_reminder(&profile.name))
        .await
        .map_err(|err| {
            error!(%member_id, error = %err, "failed to send notification");
            err
        })?;
    info!(%member_id, "fee reminder sent");

    Ok(())
}
