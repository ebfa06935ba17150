use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::instrument;

use crate::state::AppState;

use super::dto::{
    ForgotPasswordRequest, LoginRequest, MessageResponse, RegisterRequest, ResetPasswordRequest,
    ResetTicketResponse, SessionResponse,
};
use super::error::{ApiError, AuthError};
use super::extractors::{bearer_token, ValidatedJson};
use super::service::SessionInfo;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/registrar", post(register))
        .route("/esqueci-senha", post(forgot_password))
        .route("/redefinir-senha", post(reset_password))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn session_response(session: SessionInfo) -> SessionResponse {
    SessionResponse {
        token: session.token,
        expira_em: session.expires_at,
        usuario: session.user,
    }
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.senha.is_empty() {
        return Err(ApiError::Validation("email e senha são obrigatórios".into()));
    }

    let session = state.sessions().login(email, &payload.senha).await?;
    Ok(Json(session_response(session)))
}

#[instrument(skip(state, headers))]
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = bearer_token(&headers).ok_or(AuthError::InvalidToken)?;
    state.sessions().logout(token).await?;
    Ok(Json(MessageResponse {
        message: "Logout realizado com sucesso".into(),
    }))
}

#[instrument(skip(state, payload))]
async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let nome = payload.nome.trim();
    let email = payload.email.trim();

    if nome.is_empty() {
        return Err(ApiError::Validation("nome é obrigatório".into()));
    }
    if !is_valid_email(email) {
        return Err(ApiError::Validation("E-mail inválido".into()));
    }
    if payload.senha.len() < 8 {
        return Err(ApiError::Validation(
            "Senha deve ter pelo menos 8 caracteres".into(),
        ));
    }

    let session = state.sessions().register(nome, email, &payload.senha).await?;
    Ok(Json(session_response(session)))
}

#[instrument(skip(state, payload))]
async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ResetTicketResponse>, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() {
        return Err(ApiError::Validation("email é obrigatório".into()));
    }

    let ticket = state.resets().request_reset(email).await?;
    let message = if ticket.reset_token.is_some() {
        "Token gerado (mock — em produção seria enviado por e-mail)"
    } else {
        "Se o e-mail estiver cadastrado, o token de recuperação será gerado"
    };
    Ok(Json(ResetTicketResponse {
        reset_token: ticket.reset_token,
        message: message.into(),
    }))
}

#[instrument(skip(state, payload))]
async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.token.is_empty() {
        return Err(ApiError::Validation("token é obrigatório".into()));
    }
    if payload.nova_senha.len() < 8 {
        return Err(ApiError::Validation(
            "Senha deve ter pelo menos 8 caracteres".into(),
        ));
    }

    state
        .resets()
        .consume_reset(&payload.token, &payload.nova_senha)
        .await?;
    Ok(Json(MessageResponse {
        message: "Senha redefinida com sucesso".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_plain_addresses() {
        assert!(is_valid_email("ana@exemplo.com"));
        assert!(is_valid_email("a.b+c@sub.dominio.br"));
    }

    #[test]
    fn email_regex_rejects_garbage() {
        assert!(!is_valid_email("sem-arroba"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
    }
}
