use std::task::{Context, Poll};

use tower::Service;

use crate::{
    domain::Payment,
    ports::{
        clock::ClockPort,
        database::{PaymentPort, ProfilePort},
        identity::IdentityPort,
    },
};

use super::{authorize_admin, require_credentials, DomainLogic, Error, ServiceFuture};

/// Most recent payments, for the admin revenue view
pub struct ListPaymentsRequest {
    pub session: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaymentEntry {
    pub payment: Payment,
    /// Payer's display name, if the profile still exists
    pub name: Option<String>,
}

impl<D, I, C, N> Service<ListPaymentsRequest> for DomainLogic<D, I, C, N>
where
    D: PaymentPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = Vec<PaymentEntry>;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListPaymentsRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            authorize_admin(&*database, &*identity, &req.session).await?;

            let payments = database
                .recent_payments(config.payment_history_limit)
                .await?;
            let mut entries = Vec::with_capacity(payments.len());
            for payment in payments {
                let name = database
                    .get_profile(payment.member_id)
                    .await?
                    .map(|profile| profile.name);
                entries.push(PaymentEntry { payment, name });
            }

            Ok(entries)
        })
    }
}
