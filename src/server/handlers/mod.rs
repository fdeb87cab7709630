//! Thin adapters from HTTP onto `services`. Each handler authenticates,
//! takes the database lock, calls one service and serializes the result.

pub mod activity;
pub mod auth;
pub mod followups;
pub mod intake;
pub mod leads;
pub mod people;
pub mod reports;
pub mod tags;
pub mod workflows;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub version: &'static str,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub(crate) fn deleted(what: &str) -> Json<Value> {
    Json(json!({ "message": format!("{} deleted successfully", what) }))
}
