use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Placeholder gateway reference for payments without a payment id
pub const MANUAL_PAYMENT_ID: &str = "manual";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    Success,
}

/// A confirmed membership payment
#[derive(Clone, Debug, PartialEq)]
pub struct Payment {
    pub id: Uuid,
    pub member_id: Uuid,
    /// Rupees
    pub amount: f64,
    /// Order reference issued by the payment gateway
    pub order_id: String,
    pub payment_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn success(
        member_id: Uuid,
        amount: f64,
        order_id: String,
        payment_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            amount,
            order_id,
            payment_id: payment_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| MANUAL_PAYMENT_ID.to_string()),
            status: PaymentStatus::Success,
            created_at,
        }
    }
}
