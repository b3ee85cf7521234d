use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::{
    domain::{Membership, MembershipStatus, MembershipTerm, Payment, Plan, ValidationError},
    ports::{
        clock::ClockPort,
        database::{MembershipPort, PaymentPort},
        identity::IdentityPort,
    },
};

use super::{require_credentials, DomainLogic, Error, ServiceFuture};

/// Activate or renew the caller's membership after a confirmed payment
pub struct ActivateMembershipRequest {
    pub session: String,
    pub plan: String,
    /// Order reference issued by the payment gateway
    pub order_id: String,
    pub payment_id: Option<String>,
}

#[derive(Debug, PartialEq)]
pub struct ActivateMembershipResponse {
    pub membership: Membership,
    pub status: MembershipStatus,
    pub payment: Payment,
}

impl<D, I, C, N> Service<ActivateMembershipRequest> for DomainLogic<D, I, C, N>
where
    D: MembershipPort + PaymentPort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = ActivateMembershipResponse;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ActivateMembershipRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let config = self.config.clone();
        Box::pin(async move {
            let member_id = identity.authenticate(&req.session).await?;
            require_credentials(&config)?;

            let plan: Plan = req.plan.parse()?;
            let order_id = req.order_id.trim();
            if order_id.is_empty() {
                return Err(ValidationError::new("order_id", "must not be empty").into());
            }

            // Paid plans always start now at list price
            let now = clock.now();
            let term = MembershipTerm::calculate(plan, now, None)?;
            let amount = term.amount;

            let membership = match database.get_membership(member_id).await? {
                Some(mut membership) => {
                    membership.renew(term);
                    membership
                }
                None => Membership::new(member_id, term),
            };
            let membership = database.save_membership(membership).await?;

            let payment = database
                .record_payment(Payment::success(
                    member_id,
                    amount,
                    order_id.to_string(),
                    req.payment_id,
                    now,
                ))
                .await?;
            info!(
                %member_id,
                %plan,
                order_id = %payment.order_id,
                "membership activated"
            );

            Ok(ActivateMembershipResponse {
                status: membership.status_at(now),
                membership,
                payment,
            })
        })
    }
}
