use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::error::ApiError;
use crate::auth::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

use super::dto::RegistroForm;
use super::repo::Lojista;

pub fn registro_routes() -> Router<AppState> {
    Router::new()
        .route("/registros", get(list).post(create))
        .route("/registros/:id", put(update).delete(remove))
}

#[instrument(skip(state, user))]
async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Lojista>>, ApiError> {
    let rows = Lojista::list_by_user(&state.db, user.id)
        .await
        .map_err(ApiError::internal)?;
    state.audit.info(
        "REGISTROS_LISTAR",
        json!({ "usuario_id": user.id, "total": rows.len() }),
    );
    Ok(Json(rows))
}

#[instrument(skip(state, user, payload))]
async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<RegistroForm>,
) -> Result<(StatusCode, Json<Lojista>), ApiError> {
    if let Some(campo) = payload.missing_required_field() {
        state.audit.warning(
            "REGISTROS_CRIAR_VALIDATION",
            json!({ "usuario_id": user.id, "campo_faltante": campo }),
        );
        return Err(ApiError::Validation(format!(
            "Campo obrigatório ausente: {campo}"
        )));
    }

    let row = Lojista::create(&state.db, user.id, &payload)
        .await
        .map_err(ApiError::internal)?;
    state.audit.info(
        "REGISTROS_CRIADO",
        json!({ "usuario_id": user.id, "lojista_id": row.id }),
    );
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, user, payload))]
async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RegistroForm>,
) -> Result<Json<Lojista>, ApiError> {
    let row = Lojista::update(&state.db, user.id, id, &payload)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound)?;
    state.audit.info(
        "REGISTROS_ATUALIZADO",
        json!({ "usuario_id": user.id, "lojista_id": id }),
    );
    Ok(Json(row))
}

#[instrument(skip(state, user))]
async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = Lojista::delete(&state.db, user.id, id)
        .await
        .map_err(ApiError::internal)?;
    if !removed {
        return Err(ApiError::NotFound);
    }
    state.audit.info(
        "REGISTROS_DELETADO",
        json!({ "usuario_id": user.id, "lojista_id": id }),
    );
    Ok(Json(json!({ "message": "Registro removido com sucesso" })))
}
