use std::task::{Context, Poll};

use tower::Service;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    domain::{Profile, RegistrationForm},
    ports::{
        clock::ClockPort,
        database::ProfilePort,
        identity::{IdentityPort, NewAccount},
    },
};

use super::{require_credentials, DomainLogic, Error, ServiceFuture};

/// Self-service signup
pub struct RegisterMemberRequest {
    pub form: RegistrationForm,
}

#[derive(Debug, PartialEq)]
pub struct RegisterMemberResponse {
    pub member_id: Uuid,
    pub profile: Profile,
}

impl<D, I, C, N> Service<RegisterMemberRequest> for DomainLogic<D, I, C, N>
where
    D: ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = RegisterMemberResponse;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: RegisterMemberRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            let registration = req.form.validate()?;

            let member_id = identity
                .create_account(NewAccount {
                    email: registration.email.clone(),
                    password: registration.password.clone(),
                    name: registration.name.clone(),
                })
                .await?;

            let profile = registration.into_profile(member_id, clock.now());
            let profile = insert_profile_or_rollback(&*database, &*identity, profile).await?;
            info!(%member_id, "member registered");

            Ok(RegisterMemberResponse { member_id, profile })
        })
    }
}

/// Store the profile for a freshly created account, deleting the account if that fails
pub(super) async fn insert_profile_or_rollback<D, I>(
    database: &D,
    identity: &I,
    profile: Profile,
) -> Result<Profile, Error>
where
    D: ProfilePort,
    I: IdentityPort,
{
    let member_id = profile.id;
    match database.insert_profile(profile).await {
        Ok(profile) => Ok(profile),
        Err(err) => {
            error!(%member_id, error = %err, "profile creation failed, removing account");
            if let Err(rollback) = identity.delete_account(member_id).await {
                error!(%member_id, error = %rollback, "failed to remove orphaned account");
            }
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::{clock::FixedClock, notification::memory::MemoryOutbox},
        commands::testing::{call, harness, harness_with, morning},
        config::Config,
        domain::Role,
        ports::{database::MockProfilePort, identity::MockIdentityPort},
    };
    use mockall::predicate::*;
    use rstest::*;
    use speculoos::prelude::*;
    use std::sync::Arc;
    use tower::BoxError;

    #[fixture]
    fn form() -> RegistrationForm {
        RegistrationForm {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: "secret1".to_string(),
            phone: "9876543210".to_string(),
            age: "28".to_string(),
            weight: "58".to_string(),
            height: "162".to_string(),
            address: None,
            body_goal: Some("Cut".to_string()),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_register(form: RegistrationForm) -> Result<(), BoxError> {
        let harness = harness();

        let res = call(&mut harness.domain.clone(), RegisterMemberRequest { form }).await?;

        // The new member can sign in and has a member profile
        assert_that!(res.profile.role).is_equal_to(Role::Member);
        assert_that!(res.profile.body_goal).is_equal_to(Some("Cut".to_string()));
        let session = harness.identity.sign_in("asha@example.com", "secret1")?;
        assert_that!(harness.identity.authenticate(&session).await?).is_equal_to(res.member_id);
        assert_that!(harness.database.get_profile(res.member_id).await?).is_some();
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_register_twice(form: RegistrationForm) -> Result<(), BoxError> {
        let harness = harness();
        let mut domain = harness.domain.clone();
        call(&mut domain, RegisterMemberRequest { form: form.clone() }).await?;

        let res = call(&mut domain, RegisterMemberRequest { form }).await;

        assert_that!(res).is_err().matches(|err| {
            matches!(
                err,
                Error::Identity(crate::ports::identity::Error::AccountExists(_))
            )
        });
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_invalid_form(mut form: RegistrationForm) -> Result<(), BoxError> {
        form.password = "123".to_string();
        let harness = harness();

        let res = call(&mut harness.domain.clone(), RegisterMemberRequest { form }).await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::InvalidArgument(e) if e.field == "password"));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_unavailable_without_credentials(form: RegistrationForm) {
        let harness = harness_with(Config::default());

        let res = call(&mut harness.domain.clone(), RegisterMemberRequest { form }).await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Unavailable(_)));
    }

    #[derive(Debug, thiserror::Error)]
    #[error("insert rejected")]
    struct InsertRejected;

    #[rstest]
    #[tokio::test]
    async fn test_rollback_on_profile_failure(form: RegistrationForm) {
        // GIVEN an identity service that creates the account, and a profile store that
        // rejects the insert
        let member_id = Uuid::new_v4();
        let mut identity = MockIdentityPort::new();
        identity
            .expect_create_account()
            .times(1)
            .withf(|account| account.email == "asha@example.com")
            .returning(move |_| Ok(member_id));
        identity
            .expect_delete_account()
            .times(1)
            .with(eq(member_id))
            .returning(|_| Ok(()));
        let mut database = MockProfilePort::new();
        database
            .expect_insert_profile()
            .times(1)
            .withf(move |profile| profile.id == member_id)
            .returning(|_| Err(crate::ports::database::Error::Adapter(Box::new(InsertRejected))));

        let mut domain = DomainLogic::new(
            database,
            identity,
            FixedClock::new(morning()),
            MemoryOutbox::default(),
            Config::for_test(),
        )
        .unwrap();

        // WHEN registering
        let res = call(&mut domain, RegisterMemberRequest { form }).await;

        // THEN the store failure is reported and the account is removed again
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Database(_)));
        Arc::into_inner(domain.identity).unwrap().checkpoint();
        Arc::into_inner(domain.database).unwrap().checkpoint();
    }
}
