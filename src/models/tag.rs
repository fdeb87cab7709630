use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TAG_COLOR: &str = "#1E73FF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    /// Kind of entity the tag is meant for ("lead", "submission", ...).
    pub entity_type: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            color: DEFAULT_TAG_COLOR.to_string(),
            entity_type: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }
}

/// Attaches a tag to any entity by type and id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTag {
    pub id: Uuid,
    pub tag_id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl EntityTag {
    pub fn new(tag_id: Uuid, entity_type: String, entity_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag_id,
            entity_type,
            entity_id,
            created_at: Utc::now(),
        }
    }
}
