use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Comment, Lead};
use crate::server::{AppState, CurrentUser};
use crate::services::conversion::{self, ConvertRequest};
use crate::services::leads::{self, LeadPatch, NewComment, NewLead};

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<Lead>>> {
    let db = state.db()?;
    Ok(Json(leads::list_leads(&db, &actor)?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewLead>,
) -> AppResult<Json<Lead>> {
    let db = state.db()?;
    Ok(Json(leads::create_lead(&db, &actor, &request, Utc::now())?))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Lead>> {
    let db = state.db()?;
    Ok(Json(leads::get_lead(&db, &actor, id)?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<LeadPatch>,
) -> AppResult<Json<Lead>> {
    let db = state.db()?;
    Ok(Json(leads::update_lead(&db, &actor, id, &patch, Utc::now())?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    let counts = leads::delete_lead(&db, &actor, id)?;
    Ok(Json(json!({
        "message": "Lead deleted successfully",
        "deleted": counts,
    })))
}

/// The body is optional; without one the submitter stays unassigned.
pub async fn convert(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(submission_id): Path<Uuid>,
    body: Option<Json<ConvertRequest>>,
) -> AppResult<Json<Lead>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let db = state.db()?;
    let lead = conversion::convert_submission(&db, &actor, submission_id, &request, Utc::now())?;
    Ok(Json(lead))
}

pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewComment>,
) -> AppResult<Json<Comment>> {
    let db = state.db()?;
    Ok(Json(leads::add_comment(&db, &actor, &request, Utc::now())?))
}

pub async fn comments(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(lead_id): Path<Uuid>,
) -> AppResult<Json<Vec<Comment>>> {
    let db = state.db()?;
    Ok(Json(leads::list_comments(&db, &actor, lead_id)?))
}
