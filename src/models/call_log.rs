use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Stage;

/// Record of a sales call or meeting on a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub user_id: Uuid,
    pub stage: Option<Stage>,
    /// e.g. "Phone Call", "Face to Face (In Person)"
    pub activity_type: Option<String>,
    pub objective: Option<String>,
    pub planning_notes: Option<String>,
    pub post_meeting_notes: Option<String>,
    pub follow_up_notes: Option<String>,
    pub challenges: Option<String>,
    pub secured_order: bool,
    pub dollar_value: Option<f64>,
    pub meeting_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallLog {
    pub fn new(lead_id: Uuid, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            lead_id,
            user_id,
            stage: None,
            activity_type: None,
            objective: None,
            planning_notes: None,
            post_meeting_notes: None,
            follow_up_notes: None,
            challenges: None,
            secured_order: false,
            dollar_value: None,
            meeting_date: None,
            is_completed: false,
            is_cancelled: false,
            created_at: now,
            updated_at: now,
        }
    }
}
