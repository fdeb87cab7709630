use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{check, Access, Actor};
use crate::db::{is_unique_violation, Database};
use crate::error::{AppError, AppResult};
use crate::models::{Capability, EntityTag, Tag};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub color: Option<String>,
    pub entity_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
    pub entity_type: Option<String>,
}

fn can_edit(actor: &Actor) -> AppResult<()> {
    check(&actor.permissions, Capability::Leads, Access::Write)
}

fn require_tag(db: &Database, id: Uuid) -> AppResult<Tag> {
    db.get_tag(id)?
        .ok_or_else(|| AppError::not_found("tag not found"))
}

fn check_name_free(db: &Database, name: &str, except: Option<Uuid>) -> AppResult<()> {
    match db.get_tag_by_name(name)? {
        Some(tag) if Some(tag.id) != except => Err(AppError::bad_request(
            "tag with this name already exists",
        )),
        _ => Ok(()),
    }
}

pub fn list_tags(db: &Database, entity_type: Option<&str>) -> AppResult<Vec<Tag>> {
    Ok(db.list_tags(entity_type)?)
}

pub fn create_tag(db: &Database, actor: &Actor, request: &NewTag, now: DateTime<Utc>) -> AppResult<Tag> {
    can_edit(actor)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("tag name is required"));
    }
    check_name_free(db, name, None)?;

    let mut tag = Tag::new(name.to_string());
    if let Some(color) = &request.color {
        tag.color = color.clone();
    }
    tag.entity_type = request.entity_type.clone();
    tag.created_by = Some(actor.id());
    tag.created_at = now;
    db.insert_tag(&tag)?;
    Ok(tag)
}

pub fn update_tag(db: &Database, actor: &Actor, id: Uuid, patch: &TagPatch) -> AppResult<Tag> {
    can_edit(actor)?;
    let mut tag = require_tag(db, id)?;
    if let Some(name) = &patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("tag name cannot be empty"));
        }
        check_name_free(db, name, Some(tag.id))?;
        tag.name = name.to_string();
    }
    if let Some(color) = &patch.color {
        tag.color = color.clone();
    }
    if let Some(entity_type) = &patch.entity_type {
        tag.entity_type = Some(entity_type.clone());
    }
    db.update_tag(&tag)?;
    Ok(tag)
}

pub fn delete_tag(db: &Database, actor: &Actor, id: Uuid) -> AppResult<()> {
    can_edit(actor)?;
    let tag = require_tag(db, id)?;
    db.delete_tag(tag.id)?;
    Ok(())
}

pub fn entity_tags(db: &Database, entity_type: &str, entity_id: Uuid) -> AppResult<Vec<Tag>> {
    Ok(db.list_entity_tags(entity_type, entity_id)?)
}

pub fn tag_entity(
    db: &Database,
    actor: &Actor,
    entity_type: &str,
    entity_id: Uuid,
    tag_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<EntityTag> {
    can_edit(actor)?;
    let tag = require_tag(db, tag_id)?;
    if db.entity_tag_exists(tag.id, entity_type, entity_id)? {
        return Err(AppError::bad_request("entity already has this tag"));
    }
    let mut link = EntityTag::new(tag.id, entity_type.to_string(), entity_id);
    link.created_at = now;
    match db.insert_entity_tag(&link) {
        Ok(()) => Ok(link),
        Err(e)
            if e
                .downcast_ref::<rusqlite::Error>()
                .is_some_and(is_unique_violation) =>
        {
            Err(AppError::bad_request("entity already has this tag"))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn untag_entity(
    db: &Database,
    actor: &Actor,
    entity_type: &str,
    entity_id: Uuid,
    tag_id: Uuid,
) -> AppResult<()> {
    can_edit(actor)?;
    if !db.delete_entity_tag(tag_id, entity_type, entity_id)? {
        return Err(AppError::not_found("tag association not found"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_TAG_COLOR, ROLE_MARKETING};
    use crate::services::testing::Fixture;

    fn new_tag(name: &str) -> NewTag {
        NewTag {
            name: name.into(),
            color: None,
            entity_type: Some("lead".into()),
        }
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let fx = Fixture::new();
        let tag = create_tag(&fx.db, &fx.admin, &new_tag("Hot"), Utc::now()).unwrap();
        assert_eq!(tag.color, DEFAULT_TAG_COLOR);
        assert!(matches!(
            create_tag(&fx.db, &fx.admin, &new_tag("Hot"), Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));

        let other = create_tag(&fx.db, &fx.admin, &new_tag("Cold"), Utc::now()).unwrap();
        let rename = TagPatch {
            name: Some("Hot".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_tag(&fx.db, &fx.admin, other.id, &rename).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_entity_tagging() {
        let fx = Fixture::new();
        let lead = fx.lead_for("Acme", None);
        let tag = create_tag(&fx.db, &fx.admin, &new_tag("Hot"), Utc::now()).unwrap();

        tag_entity(&fx.db, &fx.admin, "lead", lead.id, tag.id, Utc::now()).unwrap();
        assert!(matches!(
            tag_entity(&fx.db, &fx.admin, "lead", lead.id, tag.id, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert_eq!(entity_tags(&fx.db, "lead", lead.id).unwrap().len(), 1);

        untag_entity(&fx.db, &fx.admin, "lead", lead.id, tag.id).unwrap();
        assert!(matches!(
            untag_entity(&fx.db, &fx.admin, "lead", lead.id, tag.id).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_mutations_need_leads_write() {
        let fx = Fixture::new();
        let marketer = fx.user("Mark", ROLE_MARKETING, None);
        assert!(matches!(
            create_tag(&fx.db, &marketer, &new_tag("Hot"), Utc::now()).unwrap_err(),
            AppError::Forbidden(_)
        ));
        assert!(list_tags(&fx.db, None).unwrap().is_empty());
    }
}
