use std::task::{Context, Poll};

use tower::Service;
use tracing::debug;

use crate::{
    domain::{Membership, MembershipStatus, Profile, Role},
    ports::{
        clock::ClockPort,
        database::{MembershipPort, ProfilePort},
        identity::IdentityPort,
    },
};

use super::{authorize_admin, require_credentials, DomainLogic, Error, ServiceFuture};

/// Every member holding a membership, for the admin members table
pub struct ListMembersRequest {
    pub session: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemberSummary {
    pub profile: Profile,
    pub membership: Membership,
    pub status: MembershipStatus,
}

/// The caller's own profile and membership
pub struct GetMembershipRequest {
    pub session: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MembershipOverview {
    pub profile: Profile,
    pub membership: Option<Membership>,
    pub status: Option<MembershipStatus>,
}

impl<D, I, C, N> Service<ListMembersRequest> for DomainLogic<D, I, C, N>
where
    D: MembershipPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = Vec<MemberSummary>;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ListMembersRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            authorize_admin(&*database, &*identity, &req.session).await?;

            let now = clock.now();
            let mut members = Vec::new();
            for profile in database.list_profiles(Role::Member).await? {
                // Accounts that never bought a plan are not listed
                if let Some(membership) = database.get_membership(profile.id).await? {
                    members.push(MemberSummary {
                        status: membership.status_at(now),
                        profile,
                        membership,
                    });
                }
            }
            debug!(count = members.len(), "listed members");

            Ok(members)
        })
    }
}

impl<D, I, C, N> Service<GetMembershipRequest> for DomainLogic<D, I, C, N>
where
    D: MembershipPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = MembershipOverview;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: GetMembershipRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        Box::pin(async move {
            let member_id = identity.authenticate(&req.session).await?;
            let profile = database
                .get_profile(member_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("profile for member {member_id}").into()))?;
            let membership = database.get_membership(member_id).await?;
            let now = clock.now();

            Ok(MembershipOverview {
                profile,
                status: membership.as_ref().map(|membership| membership.status_at(now)),
                membership,
            })
        })
    }
}
