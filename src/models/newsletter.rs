use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsletterEntry {
    pub id: Uuid,
    pub email: String,
    /// Free text as entered ("2024-05-01", "May 2024", ...).
    pub date: Option<String>,
    pub active: bool,
}

impl NewsletterEntry {
    pub fn new(email: String, date: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            date,
            active: true,
        }
    }
}
