use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::server::{AppState, CurrentUser};
use crate::services::reports::{self, ExecutiveMetrics, ManagerRollup};

pub async fn team(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<ExecutiveMetrics>>> {
    let db = state.db()?;
    Ok(Json(reports::team_performance(&db, &actor)?))
}

pub async fn org(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
) -> AppResult<Json<Vec<ManagerRollup>>> {
    let db = state.db()?;
    Ok(Json(reports::org_performance(&db, &actor)?))
}
