use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FollowUpStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: Uuid,
    pub lead_id: Option<Uuid>,
    /// Who has to follow up.
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: FollowUpStatus,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Reminder {
    pub fn new(user_id: Uuid, title: String, due_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            lead_id: None,
            user_id,
            title,
            description: None,
            due_date,
            status: FollowUpStatus::Pending,
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Moves to `status`, keeping `completed` and `completed_at` consistent.
    pub fn set_status(&mut self, status: FollowUpStatus, now: DateTime<Utc>) {
        self.status = status;
        self.completed = status == FollowUpStatus::Completed;
        self.completed_at = if self.completed { Some(now) } else { None };
    }

    /// Flipping the flag directly also moves the status.
    pub fn set_completed(&mut self, completed: bool, now: DateTime<Utc>) {
        let status = if completed {
            FollowUpStatus::Completed
        } else {
            FollowUpStatus::Pending
        };
        self.set_status(status, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_and_flag_stay_in_sync() {
        let now = Utc::now();
        let mut r = Reminder::new(Uuid::new_v4(), "Call back".into(), now);
        r.set_status(FollowUpStatus::Completed, now);
        assert!(r.completed);
        assert_eq!(r.completed_at, Some(now));

        r.set_status(FollowUpStatus::Cancelled, now);
        assert!(!r.completed);
        assert!(r.completed_at.is_none());

        r.set_completed(true, now);
        assert_eq!(r.status, FollowUpStatus::Completed);
        r.set_completed(false, now);
        assert_eq!(r.status, FollowUpStatus::Pending);
    }
}
