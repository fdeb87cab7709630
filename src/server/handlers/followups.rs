use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::deleted;
use crate::error::AppResult;
use crate::models::{CallLog, Reminder};
use crate::server::{AppState, CurrentUser};
use crate::services::followups::{
    self, CallLogFields, CallLogQuery, NewCallLog, NewReminder, ReminderPatch, ReminderQuery,
};

pub async fn list_reminders(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ReminderQuery>,
) -> AppResult<Json<Vec<Reminder>>> {
    let db = state.db()?;
    Ok(Json(followups::list_reminders(&db, &actor, &query, Utc::now())?))
}

pub async fn my_upcoming(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<Reminder>>> {
    let db = state.db()?;
    Ok(Json(followups::upcoming_reminders(&db, &actor, Utc::now())?))
}

pub async fn create_reminder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewReminder>,
) -> AppResult<Json<Reminder>> {
    let db = state.db()?;
    Ok(Json(followups::create_reminder(&db, &actor, &request, Utc::now())?))
}

pub async fn get_reminder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Reminder>> {
    let db = state.db()?;
    Ok(Json(followups::get_reminder(&db, &actor, id)?))
}

pub async fn update_reminder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ReminderPatch>,
) -> AppResult<Json<Reminder>> {
    let db = state.db()?;
    Ok(Json(followups::update_reminder(&db, &actor, id, &patch, Utc::now())?))
}

pub async fn delete_reminder(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    followups::delete_reminder(&db, &actor, id)?;
    Ok(deleted("Reminder"))
}

pub async fn list_call_logs(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<CallLogQuery>,
) -> AppResult<Json<Vec<CallLog>>> {
    let db = state.db()?;
    Ok(Json(followups::list_call_logs(&db, &actor, &query)?))
}

pub async fn create_call_log(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewCallLog>,
) -> AppResult<Json<CallLog>> {
    let db = state.db()?;
    Ok(Json(followups::create_call_log(&db, &actor, &request, Utc::now())?))
}

pub async fn get_call_log(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CallLog>> {
    let db = state.db()?;
    Ok(Json(followups::get_call_log(&db, &actor, id)?))
}

pub async fn update_call_log(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(fields): Json<CallLogFields>,
) -> AppResult<Json<CallLog>> {
    let db = state.db()?;
    Ok(Json(followups::update_call_log(&db, &actor, id, &fields, Utc::now())?))
}

pub async fn delete_call_log(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    followups::delete_call_log(&db, &actor, id)?;
    Ok(deleted("Call log"))
}
