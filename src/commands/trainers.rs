use std::task::{Context, Poll};

use tower::Service;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::{Trainer, TrainerForm},
    ports::{
        clock::ClockPort,
        database::{self, ProfilePort, TrainerPort},
        identity::IdentityPort,
    },
};

use super::{authorize_admin, require_credentials, DomainLogic, Error, ServiceFuture};

/// Public trainer directory, no session needed
pub struct ListTrainersRequest;

pub struct CreateTrainerRequest {
    pub session: String,
    pub form: TrainerForm,
}

pub struct DeleteTrainerRequest {
    pub session: String,
    pub trainer_id: Uuid,
}

impl<D, I, C, N> Service<ListTrainersRequest> for DomainLogic<D, I, C, N>
where
    D: TrainerPort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = Vec<Trainer>;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: ListTrainersRequest) -> Self::Future {
        let database = self.database.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            Ok(database.list_trainers().await?)
        })
    }
}

impl<D, I, C, N> Service<CreateTrainerRequest> for DomainLogic<D, I, C, N>
where
    D: TrainerPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = Trainer;
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CreateTrainerRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let clock = self.clock.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            let admin = authorize_admin(&*database, &*identity, &req.session).await?;

            let trainer = req.form.validate()?.into_trainer(clock.now());
            let trainer = database.insert_trainer(trainer).await?;
            info!(trainer_id = %trainer.id, admin_id = %admin.id, "trainer added");

            Ok(trainer)
        })
    }
}

impl<D, I, C, N> Service<DeleteTrainerRequest> for DomainLogic<D, I, C, N>
where
    D: TrainerPort + ProfilePort + 'static,
    I: IdentityPort + 'static,
    C: ClockPort + 'static,
{
    type Response = ();
    type Error = Error;
    type Future = ServiceFuture<Self::Response>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: DeleteTrainerRequest) -> Self::Future {
        let database = self.database.clone();
        let identity = self.identity.clone();
        let config = self.config.clone();
        Box::pin(async move {
            require_credentials(&config)?;
            let admin = authorize_admin(&*database, &*identity, &req.session).await?;

            let trainer_id = req.trainer_id;
            match database.delete_trainer(trainer_id).await {
                Ok(()) => {
                    info!(%trainer_id, admin_id = %admin.id, "trainer removed");
                    Ok(())
                }
                Err(database::Error::RecordNotFound(_)) => {
                    Err(Error::NotFound(format!("trainer {trainer_id}").into()))
                }
                Err(err) => Err(err.into()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::testing::{call, harness, harness_with},
        config::Config,
        domain::Role,
    };
    use chrono::Duration;
    use rstest::*;
    use speculoos::prelude::*;
    use tower::BoxError;

    fn form(name: &str) -> TrainerForm {
        TrainerForm {
            name: name.to_string(),
            specialty: "Strength".to_string(),
            experience: "5 years".to_string(),
            image_url: "https://example.com/trainer.png".to_string(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_list_delete() -> Result<(), BoxError> {
        let harness = harness();
        let (_, admin) = harness.sign_up("Front Desk", Role::Admin).await;
        let mut domain = harness.domain.clone();

        // WHEN adding two trainers
        let vikram = call(
            &mut domain,
            CreateTrainerRequest {
                session: admin.clone(),
                form: form("Vikram"),
            },
        )
        .await?;
        harness.clock.advance(Duration::minutes(5));
        let priya = call(
            &mut domain,
            CreateTrainerRequest {
                session: admin.clone(),
                form: form("Priya"),
            },
        )
        .await?;

        // THEN the directory lists them newest first
        let res = call(&mut domain, ListTrainersRequest).await?;
        assert_that!(res).is_equal_to(vec![priya.clone(), vikram.clone()]);

        // WHEN removing one
        call(
            &mut domain,
            DeleteTrainerRequest {
                session: admin.clone(),
                trainer_id: vikram.id,
            },
        )
        .await?;

        // THEN only the other remains, and removing it again fails
        let res = call(&mut domain, ListTrainersRequest).await?;
        assert_that!(res).is_equal_to(vec![priya]);
        let res = call(
            &mut domain,
            DeleteTrainerRequest {
                session: admin,
                trainer_id: vikram.id,
            },
        )
        .await;
        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::NotFound(_)));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_members_cannot_add_trainers() -> Result<(), BoxError> {
        let harness = harness();
        let (_, session) = harness.sign_up("Asha", Role::Member).await;

        let res = call(
            &mut harness.domain.clone(),
            CreateTrainerRequest {
                session,
                form: form("Vikram"),
            },
        )
        .await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Forbidden(_)));
        Ok(())
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_without_credentials() {
        let harness = harness_with(Config::default());

        let res = call(&mut harness.domain.clone(), ListTrainersRequest).await;

        assert_that!(res)
            .is_err()
            .matches(|err| matches!(err, Error::Unavailable(_)));
    }
}
