use crate::{
    adapters::database::memory::ErasedPoisonError,
    domain::{Notification, PushSubscription},
    ports::notification::{Error, NotificationPort},
};
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

/// A notification handed to the push service
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    pub endpoint: String,
    /// JSON payload as the device receives it
    pub payload: String,
}

#[derive(Debug, Default)]
struct Outbox {
    deliveries: Vec<Delivery>,
    /// Endpoints the push service has dropped
    gone: HashSet<String>,
}

/// Push service kept in process memory, recording every delivery
#[derive(Clone, Debug, Default)]
pub struct MemoryOutbox {
    outbox: Arc<Mutex<Outbox>>,
}

impl MemoryOutbox {
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.outbox
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .deliveries
            .clone()
    }

    /// Reject further deliveries to `endpoint`, as when a member revokes permission
    pub fn unsubscribe(&self, endpoint: &str) {
        self.outbox
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .gone
            .insert(endpoint.to_string());
    }
}

#[async_trait::async_trait]
impl NotificationPort for MemoryOutbox {
    async fn send(
        &self,
        subscription: &PushSubscription,
        notification: &Notification,
    ) -> Result<(), Error> {
        let payload =
            serde_json::to_string(notification).map_err(|err| Error::Adapter(Box::new(err)))?;

        let mut outbox = self.outbox.lock()?;
        if outbox.gone.contains(&subscription.endpoint) {
            return Err(Error::SubscriptionGone(subscription.endpoint.clone()));
        }
        outbox.deliveries.push(Delivery {
            endpoint: subscription.endpoint.clone(),
            payload,
        });
        Ok(())
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
