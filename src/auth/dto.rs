use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub senha: String,
}

/// Request body for registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub nome: String,
    pub email: String,
    pub senha: String,
}

/// Request body for the reset-token request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for consuming a reset token.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub nova_senha: String,
}

/// Public projection of a user — never the hash, counters or token fields.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub nome: Option<String>,
}

/// Response returned by login and register.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expira_em: OffsetDateTime,
    pub usuario: PublicUser,
}

/// Response for the reset-token request. Success-shaped whether or not the
/// email exists; only the token field differs.
#[derive(Debug, Serialize)]
pub struct ResetTicketResponse {
    pub reset_token: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_response_uses_portuguese_wire_names() {
        let response = SessionResponse {
            token: "ab".repeat(32),
            expira_em: OffsetDateTime::now_utc(),
            usuario: PublicUser {
                id: Uuid::new_v4(),
                email: "a@b.com".into(),
                nome: Some("Ana".into()),
            },
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("expira_em").is_some());
        assert_eq!(json["usuario"]["nome"], "Ana");
        assert_eq!(json["usuario"]["email"], "a@b.com");
    }

    #[test]
    fn public_user_never_carries_internal_fields() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            email: "a@b.com".into(),
            nome: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(!keys.iter().any(|k| k.contains("senha") || k.contains("token") || k.contains("hash")));
    }
}
