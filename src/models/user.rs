use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role_id: Uuid,
    /// Sales Executives point at their Sales Manager.
    pub manager_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String, role_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role_id,
            manager_id: None,
            created_at: Utc::now(),
        }
    }
}

/// A user as returned to API callers, with role and manager names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role_id: Uuid,
    pub role_name: Option<String>,
    pub manager_id: Option<Uuid>,
    pub manager_name: Option<String>,
}
