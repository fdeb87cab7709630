use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::ActivityFilter;
use crate::error::{AppError, AppResult};
use crate::models::{ActionKind, ActivityLog};
use crate::server::{AppState, CurrentUser};
use crate::services::activity::{self, MAX_RECENT};

#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub entity_type: Option<String>,
    pub action_type: Option<String>,
}

impl ActivityQuery {
    fn into_filter(self) -> AppResult<ActivityFilter> {
        let mut filter = ActivityFilter {
            entity_type: self.entity_type,
            action: self
                .action_type
                .map(|a| a.parse::<ActionKind>())
                .transpose()
                .map_err(AppError::BadRequest)?,
            ..Default::default()
        };
        if let Some(skip) = self.skip {
            filter.skip = skip;
        }
        if let Some(limit) = self.limit {
            filter.limit = limit;
        }
        Ok(filter)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityLog>>> {
    let filter = query.into_filter()?;
    let db = state.db()?;
    Ok(Json(activity::list_for(&db, &actor, filter)?))
}

pub async fn for_lead(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(lead_id): Path<Uuid>,
) -> AppResult<Json<Vec<ActivityLog>>> {
    let filter = ActivityFilter {
        entity_type: Some("lead".to_string()),
        entity_id: Some(lead_id),
        ..Default::default()
    };
    let db = state.db()?;
    Ok(Json(activity::list_for(&db, &actor, filter)?))
}

pub async fn for_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<ActivityLog>>> {
    let filter = ActivityFilter {
        user_id: Some(user_id),
        ..Default::default()
    };
    let db = state.db()?;
    Ok(Json(activity::list_for(&db, &actor, filter)?))
}

pub async fn recent(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Query(query): Query<RecentQuery>,
) -> AppResult<Json<Vec<ActivityLog>>> {
    let limit = query.limit.unwrap_or(20).min(MAX_RECENT);
    let filter = ActivityFilter {
        limit,
        ..Default::default()
    };
    let db = state.db()?;
    Ok(Json(activity::list_for(&db, &actor, filter)?))
}
