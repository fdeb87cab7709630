use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::server::{AppState, CurrentUser};
use crate::services::accounts::{self, ChangePassword, LoginRequest, LoginResponse, SessionUser};

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let db = state.db()?;
    let response = accounts::login(&db, &request, &state.secret, state.token_ttl, Utc::now())?;
    Ok(Json(response))
}

pub async fn me(CurrentUser(actor): CurrentUser) -> Json<SessionUser> {
    Json(accounts::me(&actor))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<ChangePassword>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    accounts::change_password(&db, &actor, &request)?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}
