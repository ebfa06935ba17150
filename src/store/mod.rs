use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Persisted user row. The hash, counters and token fields never leave the
/// auth services.
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub nome: Option<String>,
    pub password_hash: String,
    pub failed_attempts: i32,
    pub locked_until: Option<OffsetDateTime>,
    pub session_token: Option<String>,
    pub session_token_expires_at: Option<OffsetDateTime>,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

/// Fields required to create a user. Counters start at zero, token fields absent.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nome: Option<String>,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    EmailTaken,
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Single-row mutation applied inside the store's atomic unit of work.
pub type Mutation = Box<dyn FnOnce(&mut UserRecord) + Send>;

/// Credential store. Lookups match stored values exactly (case-sensitive
/// email, exact token equality); expiry checks belong to the callers.
///
/// `mutate` is the atomic read-modify-write primitive: concurrent mutations
/// of the same row serialize, so counter increments and token overwrites are
/// never lost.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_session_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Creates a user, surfacing an email-uniqueness conflict as `EmailTaken`.
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError>;

    /// Applies `mutation` to the row under the store's write lock and
    /// returns the updated record.
    async fn mutate(&self, id: Uuid, mutation: Mutation) -> Result<UserRecord, StoreError>;
}
