use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::deleted;
use crate::error::AppResult;
use crate::models::{EntityTag, Tag};
use crate::server::{AppState, CurrentUser};
use crate::services::tags::{self, NewTag, TagPatch};

#[derive(Debug, Default, Deserialize)]
pub struct TagQuery {
    pub entity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TagRef {
    pub tag_id: Uuid,
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Query(query): Query<TagQuery>,
) -> AppResult<Json<Vec<Tag>>> {
    let db = state.db()?;
    Ok(Json(tags::list_tags(&db, query.entity_type.as_deref())?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Json(request): Json<NewTag>,
) -> AppResult<Json<Tag>> {
    let db = state.db()?;
    Ok(Json(tags::create_tag(&db, &actor, &request, Utc::now())?))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<TagPatch>,
) -> AppResult<Json<Tag>> {
    let db = state.db()?;
    Ok(Json(tags::update_tag(&db, &actor, id, &patch)?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    tags::delete_tag(&db, &actor, id)?;
    Ok(deleted("Tag"))
}

pub async fn entity_tags(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> AppResult<Json<Vec<Tag>>> {
    let db = state.db()?;
    Ok(Json(tags::entity_tags(&db, &entity_type, entity_id)?))
}

pub async fn tag_entity(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
    Json(body): Json<TagRef>,
) -> AppResult<Json<EntityTag>> {
    let db = state.db()?;
    let link = tags::tag_entity(&db, &actor, &entity_type, entity_id, body.tag_id, Utc::now())?;
    Ok(Json(link))
}

pub async fn untag_entity(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    Path((entity_type, entity_id, tag_id)): Path<(String, Uuid, Uuid)>,
) -> AppResult<Json<Value>> {
    let db = state.db()?;
    tags::untag_entity(&db, &actor, &entity_type, entity_id, tag_id)?;
    Ok(deleted("Tag association"))
}
