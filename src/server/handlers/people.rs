use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::deleted;
use crate::error::AppResult;
use crate::models::{Role, UserProfile};
use crate::server::{AppState, CurrentUser};
use crate::services::users::{self, Hierarchy, NewRole, NewUser, RolePatch, UserPatch, UserQuery};

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let db = state.db()?;
    Ok(Json(users::list_users(&db, &actor, &query)?))
}

pub async fn assignable(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<UserProfile>>> {
    let db = state.db()?;
    Ok(Json(users::assignable_users(&db, &actor)?))
}

pub async fn hierarchy(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Hierarchy>> {
    let db = state.db()?;
    Ok(Json(users::hierarchy(&db, &actor)?))
}

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewUser>,
) -> AppResult<Json<UserProfile>> {
    let db = state.db()?;
    Ok(Json(users::create_user(&db, &actor, &request, Utc::now())?))
}

pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> AppResult<Json<UserProfile>> {
    let db = state.db()?;
    Ok(Json(users::update_user(&db, &actor, id, &patch, Utc::now())?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    users::delete_user(&db, &actor, id, Utc::now())?;
    Ok(deleted("User"))
}

pub async fn list_roles(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<Role>>> {
    let db = state.db()?;
    Ok(Json(users::list_roles(&db, &actor)?))
}

pub async fn create_role(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewRole>,
) -> AppResult<Json<Role>> {
    let db = state.db()?;
    Ok(Json(users::create_role(&db, &actor, &request)?))
}

pub async fn update_role(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<RolePatch>,
) -> AppResult<Json<Role>> {
    let db = state.db()?;
    Ok(Json(users::update_role(&db, &actor, id, &patch)?))
}

pub async fn delete_role(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    users::delete_role(&db, &actor, id)?;
    Ok(deleted("Role"))
}
