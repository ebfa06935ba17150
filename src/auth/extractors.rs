use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};

use crate::state::AppState;
use crate::store::UserRecord;

use super::error::{ApiError, AuthError};

/// Authorization gate for protected routes: resolves the bearer token to
/// its user or rejects with 401 before the handler runs.
pub struct AuthUser(pub UserRecord);

pub(crate) fn bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AuthError::InvalidToken)?;
        let user = state
            .sessions()
            .validate_token(token)
            .await
            .ok_or(AuthError::InvalidToken)?;
        Ok(AuthUser(user))
    }
}

/// `Json` body extractor for the API surface: a malformed or incomplete
/// body is the caller's fault, so it rejects with the 400 `{message}`
/// shape instead of axum's plain-text 422.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}
