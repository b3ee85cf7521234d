use crate::domain::{Notification, PushSubscription};

#[mockall::automock]
#[async_trait::async_trait]
pub trait NotificationPort {
    /// Deliver a notification to one subscribed device
    async fn send(
        &self,
        subscription: &PushSubscription,
        notification: &Notification,
    ) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The push service no longer accepts this subscription
    #[error("subscription for {0} is no longer valid")]
    SubscriptionGone(String),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
