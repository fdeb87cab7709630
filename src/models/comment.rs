use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub text: String,
    /// Lead status at the time the comment was written, if the author set one.
    pub status: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(lead_id: Uuid, text: String, created_by: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id,
            text,
            status: None,
            created_by,
            created_at: Utc::now(),
        }
    }
}
