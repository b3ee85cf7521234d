use crate::{
    adapters::database::memory::ErasedPoisonError,
    ports::identity::{Error, IdentityPort, NewAccount},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use uuid::Uuid;

#[derive(Clone, Debug)]
struct Account {
    member_id: Uuid,
    password: String,
}

#[derive(Debug, Default)]
struct Accounts {
    /// Keyed by lowercase email
    by_email: HashMap<String, Account>,
    /// Session token to member
    sessions: HashMap<String, Uuid>,
}

/// Identity collaborator kept in process memory
#[derive(Clone, Debug)]
pub struct MemoryIdentity {
    accounts: Arc<Mutex<Accounts>>,
}

impl MemoryIdentity {
    /// Exchange credentials for a session token
    pub fn sign_in(&self, email: &str, password: &str) -> Result<String, Error> {
        let mut accounts = self.accounts.lock()?;
        let member_id = accounts
            .by_email
            .get(&email.trim().to_lowercase())
            .filter(|account| account.password == password)
            .map(|account| account.member_id)
            .ok_or(Error::NotAuthenticated)?;

        let session = Uuid::new_v4().to_string();
        accounts.sessions.insert(session.clone(), member_id);
        Ok(session)
    }

    pub fn sign_out(&self, session: &str) -> Result<(), Error> {
        self.accounts.lock()?.sessions.remove(session);
        Ok(())
    }
}

#[async_trait::async_trait]
impl IdentityPort for MemoryIdentity {
    async fn authenticate(&self, session: &str) -> Result<Uuid, Error> {
        self.accounts
            .lock()?
            .sessions
            .get(session)
            .copied()
            .ok_or(Error::NotAuthenticated)
    }

    async fn create_account(&self, account: NewAccount) -> Result<Uuid, Error> {
        let email = account.email.trim().to_lowercase();
        let mut accounts = self.accounts.lock()?;
        if accounts.by_email.contains_key(&email) {
            return Err(Error::AccountExists(email));
        }

        let member_id = Uuid::new_v4();
        accounts.by_email.insert(
            email,
            Account {
                member_id,
                password: account.password,
            },
        );
        Ok(member_id)
    }

    async fn delete_account(&self, member_id: Uuid) -> Result<(), Error> {
        let mut accounts = self.accounts.lock()?;
        accounts
            .by_email
            .retain(|_, account| account.member_id != member_id);
        accounts.sessions.retain(|_, id| *id != member_id);
        Ok(())
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self {
            accounts: Arc::new(Mutex::new(Accounts::default())),
        }
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(err: PoisonError<T>) -> Self {
        Self::Adapter(Box::new(ErasedPoisonError(err.to_string())))
    }
}
