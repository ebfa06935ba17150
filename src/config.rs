use serde::Deserialize;

/// Lockout thresholds and token lifetimes, env-overridable.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub max_attempts: u32,
    pub lockout_minutes: i64,
    pub session_ttl_minutes: i64,
    pub reset_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthConfig {
            max_attempts: std::env::var("AUTH_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(5),
            lockout_minutes: std::env::var("AUTH_LOCKOUT_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(15),
            session_ttl_minutes: std::env::var("AUTH_SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            reset_ttl_minutes: std::env::var("AUTH_RESET_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        Ok(Self { database_url, auth })
    }
}
