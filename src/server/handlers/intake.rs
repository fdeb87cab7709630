use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::deleted;
use crate::error::AppResult;
use crate::models::{FormField, FormSubmission, NewsletterEntry, Submission};
use crate::server::{AppState, CurrentUser};
use crate::services::intake::{
    self, NewFormField, NewNewsletterEntry, NewSubmission, StatusPatch, SubmissionFilter,
};

#[derive(Debug, Default, Deserialize)]
pub struct FormTypeQuery {
    pub form_type: Option<String>,
}

/// Public: the website posts here without credentials.
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<NewSubmission>,
) -> AppResult<Json<Submission>> {
    let db = state.db()?;
    Ok(Json(intake::submit(&db, &request, Utc::now())?))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<FormTypeQuery>,
) -> AppResult<Json<Vec<Submission>>> {
    let db = state.db()?;
    let subs = intake::list_submissions(&db, &actor, query.form_type.as_deref())?;
    Ok(Json(subs))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Submission>> {
    let db = state.db()?;
    Ok(Json(intake::get_submission(&db, &actor, id)?))
}

pub async fn filter(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<SubmissionFilter>,
) -> AppResult<Json<Vec<Submission>>> {
    let db = state.db()?;
    Ok(Json(intake::filter_submissions(&db, &actor, &request)?))
}

pub async fn set_status(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<StatusPatch>,
) -> AppResult<Json<Submission>> {
    let db = state.db()?;
    Ok(Json(intake::set_submission_status(&db, &actor, id, &patch)?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    intake::delete_submission(&db, &actor, id)?;
    Ok(deleted("Submission"))
}

// The CRM source takes the database lock itself, so none is held here.
pub async fn form_submissions(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<FormTypeQuery>,
) -> AppResult<Json<Vec<FormSubmission>>> {
    let subs = intake::form_submissions(state.source.as_ref(), &actor, query.form_type.as_deref())?;
    Ok(Json(subs))
}

pub async fn form_submissions_of(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(form_type): Path<String>,
) -> AppResult<Json<Vec<FormSubmission>>> {
    let subs = intake::form_submissions(state.source.as_ref(), &actor, Some(&form_type))?;
    Ok(Json(subs))
}

pub async fn newsletter(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
) -> AppResult<Json<Vec<NewsletterEntry>>> {
    let db = state.db()?;
    Ok(Json(intake::list_newsletter(&db)?))
}

pub async fn add_newsletter(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Json(request): Json<NewNewsletterEntry>,
) -> AppResult<Json<NewsletterEntry>> {
    let db = state.db()?;
    Ok(Json(intake::add_newsletter_entry(&db, &request)?))
}

pub async fn toggle_newsletter(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<NewsletterEntry>> {
    let db = state.db()?;
    Ok(Json(intake::toggle_newsletter_entry(&db, id)?))
}

/// Public, so the website can render its forms.
pub async fn form_fields(
    State(state): State<AppState>,
    Path(form_type): Path<String>,
) -> AppResult<Json<Vec<FormField>>> {
    let db = state.db()?;
    Ok(Json(intake::form_fields(&db, &form_type)?))
}

pub async fn add_form_field(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewFormField>,
) -> AppResult<Json<FormField>> {
    let db = state.db()?;
    Ok(Json(intake::add_form_field(&db, &actor, &request)?))
}
