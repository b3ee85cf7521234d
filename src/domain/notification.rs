use serde::{Deserialize, Serialize};

use super::ValidationError;

const FEE_REMINDER_TITLE: &str = "Fee Reminder - MFP Gym";

/// Web push subscription registered by a member's browser
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

impl PushSubscription {
    /// Parse the JSON document handed over by the browser
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let subscription: Self = serde_json::from_str(raw).map_err(|err| {
            ValidationError::new("subscription", format!("not a push subscription: {err}"))
        })?;
        if subscription.endpoint.trim().is_empty() {
            return Err(ValidationError::new("subscription", "endpoint must not be empty"));
        }

        Ok(subscription)
    }
}

/// Message shown by the member's device
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn fee_reminder(name: &str) -> Self {
        Self {
            title: FEE_REMINDER_TITLE.to_string(),
            body: format!(
                "Hi {name}, your gym membership is ending soon. \
                 Please renew to continue your training!"
            ),
        }
    }
}
