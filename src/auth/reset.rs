use std::sync::Arc;

use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::audit::AuditLog;
use crate::store::{UserRecord, UserStore};

use super::error::AuthError;
use super::password::hash_password;
use super::token::generate_token;

/// Outcome of a reset request. Always success-shaped: an unknown email
/// yields a ticket with no token, indistinguishable in shape from a hit.
#[derive(Debug, Clone)]
pub struct ResetTicket {
    pub reset_token: Option<String>,
}

/// Reset-token lifecycle: issuance, validation and consumption. Delivering
/// the token (by email) is an external collaborator's concern; the core's
/// job ends at minting it.
#[derive(Clone)]
pub struct PasswordResetManager {
    store: Arc<dyn UserStore>,
    reset_ttl: Duration,
    audit: AuditLog,
}

fn reset_alive(user: &UserRecord, now: OffsetDateTime) -> bool {
    matches!(user.reset_token_expires_at, Some(exp) if exp > now)
}

impl PasswordResetManager {
    pub fn new(store: Arc<dyn UserStore>, reset_ttl: Duration, audit: AuditLog) -> Self {
        Self {
            store,
            reset_ttl,
            audit,
        }
    }

    /// Issues a reset token for `email`, overwriting any previous one.
    /// Unknown emails still succeed (enumeration prevention) but are
    /// audited internally.
    pub async fn request_reset(&self, email: &str) -> Result<ResetTicket, AuthError> {
        let now = OffsetDateTime::now_utc();

        let user = match self.store.find_by_email(email).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.audit
                    .warning("FORGOT_PASSWORD_EMAIL_NOT_FOUND", json!({ "email": email }));
                return Ok(ResetTicket { reset_token: None });
            }
            Err(e) => return Err(self.internal("FORGOT_PASSWORD_STORE_ERROR", e)),
        };

        let token = generate_token();
        let expires_at = now + self.reset_ttl;
        let stored = token.clone();
        self.store
            .mutate(
                user.id,
                Box::new(move |u| {
                    u.reset_token = Some(stored);
                    u.reset_token_expires_at = Some(expires_at);
                }),
            )
            .await
            .map_err(|e| self.internal("FORGOT_PASSWORD_STORE_ERROR", e))?;

        self.audit
            .info("FORGOT_PASSWORD_TOKEN_GENERATED", json!({ "email": email }));
        Ok(ResetTicket {
            reset_token: Some(token),
        })
    }

    /// Consumes a reset token: rehashes the password and clears both reset
    /// fields. Lockout state is deliberately left untouched — a password
    /// reset does not unlock a locked account.
    pub async fn consume_reset(&self, token: &str, nova_senha: &str) -> Result<(), AuthError> {
        let now = OffsetDateTime::now_utc();

        let user = match self.store.find_by_reset_token(token).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.audit.warning("RESET_PASSWORD_INVALID_TOKEN", json!({}));
                return Err(AuthError::InvalidToken);
            }
            Err(e) => return Err(self.internal("RESET_PASSWORD_STORE_ERROR", e)),
        };

        if !reset_alive(&user, now) {
            self.audit.warning("RESET_PASSWORD_INVALID_TOKEN", json!({}));
            return Err(AuthError::InvalidToken);
        }

        let password_hash =
            hash_password(nova_senha).map_err(|e| self.internal("RESET_PASSWORD_HASH_ERROR", e))?;

        self.store
            .mutate(
                user.id,
                Box::new(move |u| {
                    u.password_hash = password_hash;
                    u.reset_token = None;
                    u.reset_token_expires_at = None;
                }),
            )
            .await
            .map_err(|e| self.internal("RESET_PASSWORD_STORE_ERROR", e))?;

        self.audit
            .info("RESET_PASSWORD_SUCCESS", json!({ "usuario_id": user.id }));
        Ok(())
    }

    fn internal(&self, event: &str, err: impl Into<anyhow::Error>) -> AuthError {
        let err = err.into();
        self.audit
            .error(event, json!({ "error": format!("{err:#}") }));
        AuthError::Internal(err)
    }
}
