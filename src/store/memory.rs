use std::collections::HashMap;
use std::sync::Mutex;

use time::OffsetDateTime;
use uuid::Uuid;

use super::{Mutation, NewUser, StoreError, UserRecord, UserStore};

/// In-memory credential store. Backs `AppState::fake()` and the service
/// tests; the map mutex gives the same per-row serialization guarantee as
/// the Postgres transaction.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_where<F>(&self, predicate: F) -> Result<Option<UserRecord>, StoreError>
    where
        F: Fn(&UserRecord) -> bool,
    {
        let users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        Ok(users.values().find(|u| predicate(u)).cloned())
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.find_where(|u| u.email == email)
    }

    async fn find_by_session_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        self.find_where(|u| u.session_token.as_deref() == Some(token))
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        self.find_where(|u| u.reset_token.as_deref() == Some(token))
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        // A panicked mutation poisons the mutex; recover the guard instead
        // of propagating the panic to every later caller.
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        if users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::EmailTaken);
        }
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: new_user.email,
            nome: new_user.nome,
            password_hash: new_user.password_hash,
            failed_attempts: 0,
            locked_until: None,
            session_token: None,
            session_token_expires_at: None,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn mutate(&self, id: Uuid, mutation: Mutation) -> Result<UserRecord, StoreError> {
        let mut users = self.users.lock().unwrap_or_else(|e| e.into_inner());
        let user = users.get_mut(&id).ok_or(StoreError::NotFound)?;
        mutation(user);
        Ok(user.clone())
    }
}
