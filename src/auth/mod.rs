use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod lockout;
pub mod password;
pub mod reset;
pub mod service;
pub mod token;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
