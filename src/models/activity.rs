use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// What an activity log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    LeadConverted,
    LeadCreated,
    LeadUpdated,
    StatusChanged,
    LeadAssigned,
    CommentAdded,
    UserCreated,
    UserUpdated,
    UserDeleted,
    Login,
    LeadDeleted,
    EmailSent,
    InactiveLeadProcessed,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeadConverted => "lead_converted",
            Self::LeadCreated => "lead_created",
            Self::LeadUpdated => "lead_updated",
            Self::StatusChanged => "status_changed",
            Self::LeadAssigned => "lead_assigned",
            Self::CommentAdded => "comment_added",
            Self::UserCreated => "user_created",
            Self::UserUpdated => "user_updated",
            Self::UserDeleted => "user_deleted",
            Self::Login => "login",
            Self::LeadDeleted => "lead_deleted",
            Self::EmailSent => "email_sent",
            Self::InactiveLeadProcessed => "inactive_lead_processed",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead_converted" => Ok(Self::LeadConverted),
            "lead_created" => Ok(Self::LeadCreated),
            "lead_updated" => Ok(Self::LeadUpdated),
            "status_changed" => Ok(Self::StatusChanged),
            "lead_assigned" => Ok(Self::LeadAssigned),
            "comment_added" => Ok(Self::CommentAdded),
            "user_created" => Ok(Self::UserCreated),
            "user_updated" => Ok(Self::UserUpdated),
            "user_deleted" => Ok(Self::UserDeleted),
            "login" => Ok(Self::Login),
            "lead_deleted" => Ok(Self::LeadDeleted),
            "email_sent" => Ok(Self::EmailSent),
            "inactive_lead_processed" => Ok(Self::InactiveLeadProcessed),
            _ => Err(format!("unknown action: {}", s)),
        }
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    /// Actor. Kept as-is after the user is deleted.
    pub user_id: Uuid,
    pub action: ActionKind,
    pub description: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    pub fn new(
        user_id: Uuid,
        action: ActionKind,
        description: String,
        entity_type: impl Into<String>,
        entity_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action,
            description,
            entity_type: entity_type.into(),
            entity_id,
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = metadata {
            self.metadata = map;
        }
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
