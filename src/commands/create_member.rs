use std::task::{Context, Poll};

use tower::Service;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::{Membership, MembershipStatus, MembershipTerm, NewMemberForm},
    ports::{
        clock::ClockPort,
        database::{MembershipPort, ProfilePort},
        identity::{IdentityPort, NewAccount},
    },
};

use super::{
    authorize_admin, register_member::insert_profile_or_rollback, require_credentials,
    DomainLogic, Error, ServiceFuture,
};

/// An admin enrols a member at the front desk, or digitises a paper record
pub struct CreateMemberRequest {
    pub session: String,
    pub form: NewMemberForm,
}

#[derive(Debug, PartialEq)]
pub struct CreateMemberResponse {
    pub member_id: Uuid,
    pub membership: Membership,
    /// Backdated entries may already be expired
    pub status: MembershipStatus,
}

impl<D, I, C, N> Service<CreateMemberRequest> for DomainLogic<D, I, C, N>
where
    D: MembershipPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = CreateMemberResponse;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CreateMemberRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            let admin = authorize_admin(&*database, &*identity, &req.session).await?;

            let member = req.form.validate()?;
            let now = clock.now();
            // Computed before any account exists so a bad date leaves nothing behind
            let term =
                MembershipTerm::calculate(member.plan, member.start_date(now), member.amount)?;

            // The phone number is the temporary password
            let member_id = identity
                .create_account(NewAccount {
                    email: member.email.clone(),
                    password: member.phone.clone(),
                    name: member.name.clone(),
                })
                .await?;
            insert_profile_or_rollback(&*database, &*identity, member.profile(member_id, now))
                .await?;

            let membership = database
                .save_membership(Membership::new(member_id, term))
                .await?;
            let status = membership.status_at(now);
            info!(
                %member_id,
                admin_id = %admin.id,
                plan = %membership.plan,
                %status,
                "member created"
            );

            Ok(CreateMemberResponse {
                member_id,
                membership,
                status,
            })
        })
    }
}
