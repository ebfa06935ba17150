use sqlx::PgPool;
use uuid::Uuid;

use super::{Mutation, NewUser, StoreError, UserRecord, UserStore};

const USER_COLUMNS: &str = "id, email, nome, password_hash, failed_attempts, locked_until, \
     session_token, session_token_expires_at, reset_token, reset_token_expires_at, created_at";

/// Postgres-backed credential store.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by_column(&self, column: &str, value: &str) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios WHERE {column} = $1");
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::EmailTaken,
            sqlx::Error::RowNotFound => StoreError::NotFound,
            _ => StoreError::Other(e.into()),
        }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.find_by_column("email", email).await
    }

    async fn find_by_session_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        self.find_by_column("session_token", token).await
    }

    async fn find_by_reset_token(&self, token: &str) -> Result<Option<UserRecord>, StoreError> {
        self.find_by_column("reset_token", token).await
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, StoreError> {
        let sql = format!(
            "INSERT INTO usuarios (nome, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(new_user.nome)
            .bind(new_user.email)
            .bind(new_user.password_hash)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn mutate(&self, id: Uuid, mutation: Mutation) -> Result<UserRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent read-modify-write cycles on the
        // same account; storage failures roll back on drop.
        let sql = format!("SELECT {USER_COLUMNS} FROM usuarios WHERE id = $1 FOR UPDATE");
        let mut user = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        mutation(&mut user);

        sqlx::query(
            r#"
            UPDATE usuarios
            SET email = $2,
                nome = $3,
                password_hash = $4,
                failed_attempts = $5,
                locked_until = $6,
                session_token = $7,
                session_token_expires_at = $8,
                reset_token = $9,
                reset_token_expires_at = $10
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.nome)
        .bind(&user.password_hash)
        .bind(user.failed_attempts)
        .bind(user.locked_until)
        .bind(&user.session_token)
        .bind(user.session_token_expires_at)
        .bind(&user.reset_token)
        .bind(user.reset_token_expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(user)
    }
}
