use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::server::{AppState, CurrentUser};
use crate::services::{inactivity, workflows};

/// One body shape for every workflow; each endpoint checks the fields it needs.
#[derive(Debug, Default, Deserialize)]
pub struct WorkflowRequest {
    pub submission_id: Option<Uuid>,
    pub lead_id: Option<Uuid>,
    pub email: Option<String>,
    #[serde(alias = "assigned_to_id")]
    pub assigned_to_user_id: Option<Uuid>,
}

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::bad_request(format!("{} is required", field)))
}

fn done(message: impl Into<String>, extra: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert("message".to_string(), Value::String(message.into()));
    if let Value::Object(fields) = extra {
        body.extend(fields);
    }
    Json(Value::Object(body))
}

pub async fn demo_request(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<WorkflowRequest>,
) -> AppResult<Json<Value>> {
    let submission_id = required(request.submission_id, "submission_id")?;
    let db = state.db()?;
    let out = workflows::demo_request(
        &db,
        &actor,
        submission_id,
        request.assigned_to_user_id,
        Utc::now(),
    )?;
    Ok(done(
        "Demo request workflow executed successfully",
        json!({ "lead_id": out.lead.id, "reminder_id": out.reminder.id }),
    ))
}

pub async fn brochure_download(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<WorkflowRequest>,
) -> AppResult<Json<Value>> {
    let submission_id = required(request.submission_id, "submission_id")?;
    let db = state.db()?;
    let out = workflows::brochure_download(
        &db,
        &actor,
        submission_id,
        request.assigned_to_user_id,
        Utc::now(),
    )?;
    Ok(done(
        "Brochure workflow executed successfully",
        json!({ "lead_id": out.lead.id, "reminder_id": out.reminder.id }),
    ))
}

pub async fn newsletter_signup(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<WorkflowRequest>,
) -> AppResult<Json<Value>> {
    let email = required(request.email, "email")?;
    let db = state.db()?;
    let out = workflows::newsletter_signup(&db, &actor, &email, Utc::now())?;
    Ok(done(
        "Newsletter workflow executed successfully",
        json!({
            "tagged": out.tagged,
            "tag_id": out.tag_id,
            "submission_id": out.submission_id,
        }),
    ))
}

pub async fn inactive_lead(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<WorkflowRequest>,
) -> AppResult<Json<Value>> {
    let lead_id = required(request.lead_id, "lead_id")?;
    let db = state.db()?;
    let outcome = inactivity::process_lead(&db, &actor, lead_id, Utc::now())?;
    let extra = serde_json::to_value(&outcome).map_err(anyhow::Error::from)?;
    Ok(done("Inactive lead workflow executed", extra))
}

pub async fn process_inactive_leads(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    let summary = inactivity::process_all(&db, &actor, Utc::now())?;
    let message = format!("Processed {} inactive leads", summary.processed.len());
    let extra = serde_json::to_value(&summary).map_err(anyhow::Error::from)?;
    Ok(done(message, extra))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_merges_fields() {
        let Json(body) = done("ok", json!({ "lead_id": "abc" }));
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "ok");
        assert_eq!(body["lead_id"], "abc");
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some(3), "lead_id").unwrap(), 3);
        let err = required::<Uuid>(None, "lead_id").unwrap_err();
        assert_eq!(err.to_string(), "lead_id is required");
    }
}
