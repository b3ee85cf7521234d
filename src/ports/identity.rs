use uuid::Uuid;

/// Credentials for a new account with the identity collaborator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[mockall::automock]
#[async_trait::async_trait]
pub trait IdentityPort {
    /// Resolve a session token to the signed-in member
    async fn authenticate(&self, session: &str) -> Result<Uuid, Error>;
    /// Create a confirmed account and return its identifier
    async fn create_account(&self, account: NewAccount) -> Result<Uuid, Error>;
    /// Remove an account, used to roll back a failed signup
    async fn delete_account(&self, member_id: Uuid) -> Result<(), Error>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No signed-in identity for this session
    #[error("not authenticated")]
    NotAuthenticated,

    /// Domain-level error when the email is already registered
    #[error("an account for {0} already exists")]
    AccountExists(String),

    /// Concrete adapter errors
    ///
    /// This could represent any errors from a concrete adapter that is not part of the domain
    /// model, such as connectivity, configuration, or permission errors.
    #[error("adapter error: {0:?}")]
    Adapter(Box<dyn std::error::Error + Send + Sync>),
}
