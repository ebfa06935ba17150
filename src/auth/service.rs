use std::sync::Arc;

use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::audit::AuditLog;
use crate::store::{NewUser, StoreError, UserRecord, UserStore};

use super::dto::PublicUser;
use super::error::AuthError;
use super::lockout::LockoutPolicy;
use super::password::{hash_password, verify_password};
use super::token::generate_token;

/// Issued session: bearer token, its expiry, and the public user projection.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub token: String,
    pub expires_at: OffsetDateTime,
    pub user: PublicUser,
}

/// Orchestrates login, logout, registration and bearer-token validation on
/// top of the credential store, hasher, token generator and lockout policy.
///
/// Every state-mutating step runs through `UserStore::mutate`, the store's
/// atomic unit of work, so concurrent attempts against one account
/// serialize and counter updates are never lost.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn UserStore>,
    policy: LockoutPolicy,
    session_ttl: Duration,
    audit: AuditLog,
}

fn session_alive(user: &UserRecord, now: OffsetDateTime) -> bool {
    matches!(user.session_token_expires_at, Some(exp) if exp > now)
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn UserStore>,
        policy: LockoutPolicy,
        session_ttl: Duration,
        audit: AuditLog,
    ) -> Self {
        Self {
            store,
            policy,
            session_ttl,
            audit,
        }
    }

    /// Authenticates an email/password pair.
    ///
    /// Unknown email and wrong password both fail with
    /// `InvalidCredentials`; the lock check runs before the hash so a
    /// locked account rejects even the correct password.
    pub async fn login(&self, email: &str, senha: &str) -> Result<SessionInfo, AuthError> {
        let now = OffsetDateTime::now_utc();

        let user = match self.store.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.audit.warning("LOGIN_USER_NOT_FOUND", json!({ "email": email }));
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(self.internal("LOGIN_STORE_ERROR", e)),
        };

        if self.policy.is_locked(&user, now) {
            self.audit.warning("LOGIN_ACCOUNT_LOCKED", json!({ "email": email }));
            return Err(AuthError::AccountLocked);
        }

        let password_ok = verify_password(senha, &user.password_hash)
            .map_err(|e| self.internal("LOGIN_HASH_ERROR", e))?;

        if !password_ok {
            let policy = self.policy;
            let updated = self
                .store
                .mutate(user.id, Box::new(move |u| policy.record_failure(u, now)))
                .await
                .map_err(|e| self.internal("LOGIN_STORE_ERROR", e))?;
            self.audit.warning(
                "LOGIN_WRONG_PASSWORD",
                json!({ "email": email, "tentativas": updated.failed_attempts }),
            );
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.issue_session(user.id, now).await?;
        self.audit
            .info("LOGIN_SUCCESS", json!({ "email": email, "usuario_id": user.id }));
        Ok(session)
    }

    /// Invalidates the session behind `token`. Destructive, no grace
    /// period; an expired or unknown token fails with `InvalidToken`.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let now = OffsetDateTime::now_utc();

        let user = match self.store.find_by_session_token(token).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(AuthError::InvalidToken),
            Err(e) => return Err(self.internal("LOGOUT_STORE_ERROR", e)),
        };

        if !session_alive(&user, now) {
            return Err(AuthError::InvalidToken);
        }

        self.store
            .mutate(
                user.id,
                Box::new(|u| {
                    u.session_token = None;
                    u.session_token_expires_at = None;
                }),
            )
            .await
            .map_err(|e| self.internal("LOGOUT_STORE_ERROR", e))?;

        self.audit
            .info("LOGOUT_SUCCESS", json!({ "usuario_id": user.id }));
        Ok(())
    }

    /// Resolves a bearer token to its user, or `None` for unknown and
    /// expired tokens alike. Expired tokens are only compared, never
    /// deleted here — invalidation happens via logout or the overwrite on
    /// the next login.
    pub async fn validate_token(&self, token: &str) -> Option<UserRecord> {
        let now = OffsetDateTime::now_utc();
        match self.store.find_by_session_token(token).await {
            Ok(Some(user)) if session_alive(&user, now) => Some(user),
            Ok(_) => None,
            Err(e) => {
                self.audit
                    .error("VALIDATE_TOKEN_ERROR", json!({ "error": e.to_string() }));
                None
            }
        }
    }

    /// Creates an account and logs it straight in, returning the same
    /// projection as `login`. A taken email is a validation-category
    /// failure, not an internal error.
    pub async fn register(
        &self,
        nome: &str,
        email: &str,
        senha: &str,
    ) -> Result<SessionInfo, AuthError> {
        let now = OffsetDateTime::now_utc();

        match self.store.find_by_email(email).await {
            Ok(Some(_)) => {
                self.audit
                    .warning("REGISTER_EMAIL_TAKEN", json!({ "email": email }));
                return Err(AuthError::EmailTaken);
            }
            Ok(None) => {}
            Err(e) => return Err(self.internal("REGISTER_STORE_ERROR", e)),
        }

        let password_hash =
            hash_password(senha).map_err(|e| self.internal("REGISTER_HASH_ERROR", e))?;

        let user = match self
            .store
            .create(NewUser {
                nome: Some(nome.to_string()),
                email: email.to_string(),
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            // The unique index can still race the pre-check.
            Err(StoreError::EmailTaken) => {
                self.audit
                    .warning("REGISTER_EMAIL_TAKEN", json!({ "email": email }));
                return Err(AuthError::EmailTaken);
            }
            Err(e) => return Err(self.internal("REGISTER_STORE_ERROR", e)),
        };

        let session = self.issue_session(user.id, now).await?;
        self.audit
            .info("REGISTER_SUCCESS", json!({ "email": email, "usuario_id": user.id }));
        Ok(session)
    }

    /// Mints a fresh session token and persists it, silently overwriting
    /// any previous one (single active session per user).
    async fn issue_session(
        &self,
        user_id: uuid::Uuid,
        now: OffsetDateTime,
    ) -> Result<SessionInfo, AuthError> {
        let token = generate_token();
        let expires_at = now + self.session_ttl;
        let policy = self.policy;
        let stored = token.clone();

        let user = self
            .store
            .mutate(
                user_id,
                Box::new(move |u| {
                    policy.record_success(u);
                    u.session_token = Some(stored);
                    u.session_token_expires_at = Some(expires_at);
                }),
            )
            .await
            .map_err(|e| self.internal("SESSION_STORE_ERROR", e))?;

        Ok(SessionInfo {
            token,
            expires_at,
            user: PublicUser {
                id: user.id,
                email: user.email,
                nome: user.nome,
            },
        })
    }

    fn internal(&self, event: &str, err: impl Into<anyhow::Error>) -> AuthError {
        let err = err.into();
        self.audit
            .error(event, json!({ "error": format!("{err:#}") }));
        AuthError::Internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;

    fn manager() -> (Arc<MemoryUserStore>, SessionManager) {
        let store = Arc::new(MemoryUserStore::new());
        let manager = SessionManager::new(
            store.clone(),
            LockoutPolicy::default(),
            Duration::hours(1),
            AuditLog::with_defaults(),
        );
        (store, manager)
    }

    async fn seed(manager: &SessionManager) -> SessionInfo {
        manager
            .register("Ana", "ana@exemplo.com", "senha-segura")
            .await
            .expect("register")
    }

    #[tokio::test]
    async fn login_with_unknown_email_fails_generically() {
        let (_, manager) = manager();
        let err = manager.login("ninguem@exemplo.com", "tanto-faz").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn wrong_password_increments_counter_without_locking() {
        let (store, manager) = manager();
        seed(&manager).await;

        for expected in 1..=4 {
            let err = manager.login("ana@exemplo.com", "errada").await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
            let user = store
                .find_by_email("ana@exemplo.com")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(user.failed_attempts, expected);
            assert!(user.locked_until.is_none());
        }
    }

    #[tokio::test]
    async fn fifth_failure_locks_even_against_correct_password() {
        let (store, manager) = manager();
        seed(&manager).await;

        for _ in 0..5 {
            let _ = manager.login("ana@exemplo.com", "errada").await;
        }
        let user = store
            .find_by_email("ana@exemplo.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.failed_attempts, 5);
        assert!(user.locked_until.is_some());

        let err = manager
            .login("ana@exemplo.com", "senha-segura")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
    }

    #[tokio::test]
    async fn successful_login_resets_counters_and_clears_expired_lock() {
        let (store, manager) = manager();
        let seeded = seed(&manager).await;

        for _ in 0..5 {
            let _ = manager.login("ana@exemplo.com", "errada").await;
        }
        // Age the lock past its window; the comparison must treat it as
        // inactive without anyone deleting it.
        let id = store
            .find_by_email("ana@exemplo.com")
            .await
            .unwrap()
            .unwrap()
            .id;
        store
            .mutate(
                id,
                Box::new(|u| {
                    u.locked_until = Some(OffsetDateTime::now_utc() - Duration::seconds(1));
                }),
            )
            .await
            .unwrap();

        let session = manager
            .login("ana@exemplo.com", "senha-segura")
            .await
            .expect("login after lock expiry");
        assert_ne!(session.token, seeded.token);

        let user = store
            .find_by_email("ana@exemplo.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.failed_attempts, 0);
        assert!(user.locked_until.is_none());
    }

    #[tokio::test]
    async fn issued_tokens_are_64_hex_and_validate_until_expiry() {
        let (store, manager) = manager();
        let session = seed(&manager).await;

        assert_eq!(session.token.len(), 64);
        assert!(session
            .token
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let user = manager.validate_token(&session.token).await.expect("valid");
        assert_eq!(user.email, "ana@exemplo.com");

        // At/after expiry the same token is rejected.
        store
            .mutate(
                user.id,
                Box::new(|u| {
                    u.session_token_expires_at = Some(OffsetDateTime::now_utc());
                }),
            )
            .await
            .unwrap();
        assert!(manager.validate_token(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn validate_rejects_never_issued_token() {
        let (_, manager) = manager();
        seed(&manager).await;
        assert!(manager.validate_token(&"0".repeat(64)).await.is_none());
    }

    #[tokio::test]
    async fn logout_makes_the_token_unusable() {
        let (_, manager) = manager();
        let session = seed(&manager).await;

        manager.logout(&session.token).await.expect("logout");
        assert!(manager.validate_token(&session.token).await.is_none());

        let err = manager.logout(&session.token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn new_login_overwrites_the_previous_session() {
        let (_, manager) = manager();
        let first = seed(&manager).await;

        let second = manager
            .login("ana@exemplo.com", "senha-segura")
            .await
            .expect("login");
        assert_ne!(first.token, second.token);
        assert!(manager.validate_token(&first.token).await.is_none());
        assert!(manager.validate_token(&second.token).await.is_some());
    }

    #[tokio::test]
    async fn register_rejects_taken_email() {
        let (_, manager) = manager();
        seed(&manager).await;
        let err = manager
            .register("Outra", "ana@exemplo.com", "outra-senha")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let (_, manager) = manager();
        let registered = seed(&manager).await;
        assert_eq!(registered.user.nome.as_deref(), Some("Ana"));

        let logged_in = manager
            .login("ana@exemplo.com", "senha-segura")
            .await
            .expect("login");
        assert_ne!(registered.token, logged_in.token);
        assert_eq!(registered.user.id, logged_in.user.id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_wrong_passwords_both_count() {
        let (store, manager) = manager();
        seed(&manager).await;

        let a = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.login("ana@exemplo.com", "errada").await })
        };
        let b = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.login("ana@exemplo.com", "errada").await })
        };
        assert!(a.await.unwrap().is_err());
        assert!(b.await.unwrap().is_err());

        let user = store
            .find_by_email("ana@exemplo.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.failed_attempts, 2);
    }
}
