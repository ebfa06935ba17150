use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Authentication failures. Each variant carries a fixed user-facing
/// message; unknown-email and wrong-password both surface as
/// `InvalidCredentials` so responses cannot be used to enumerate accounts.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credenciais inválidas")]
    InvalidCredentials,
    #[error("Conta bloqueada temporariamente. Tente novamente em alguns minutos.")]
    AccountLocked,
    #[error("Token inválido ou expirado")]
    InvalidToken,
    #[error("Este e-mail já está cadastrado")]
    EmailTaken,
    /// Storage or runtime failure. Detail stays server-side; the caller
    /// only ever sees the generic message.
    #[error("Erro interno")]
    Internal(#[from] anyhow::Error),
}

/// Request-level error surface: validation detail for the caller's own
/// mistakes, plus the auth taxonomy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Registro não encontrado")]
    NotFound,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    /// Wraps an unexpected failure. The detail is logged here, once, and
    /// the caller only ever sees the generic message.
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        let err = err.into();
        error!(error = ?err, "internal error");
        Self::Auth(AuthError::Internal(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Auth(AuthError::EmailTaken) => StatusCode::CONFLICT,
            ApiError::Auth(AuthError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::Auth(self).into_response()
    }
}
