use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SubmissionStatus {
    #[default]
    New,
    Converted,
    Archived,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Converted => "Converted",
            Self::Archived => "Archived",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(Self::New),
            "Converted" => Ok(Self::Converted),
            "Archived" => Ok(Self::Archived),
            _ => Err(format!(
                "invalid submission status '{}': must be New, Converted or Archived",
                s
            )),
        }
    }
}

/// A form filled in on the public website.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub form_type: String,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    /// Free-form payload; always a JSON object.
    pub data: serde_json::Map<String, serde_json::Value>,
    pub status: SubmissionStatus,
    pub lead_id: Option<Uuid>,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(form_type: String, name: String, email: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_type,
            name,
            email,
            company: None,
            data: serde_json::Map::new(),
            status: SubmissionStatus::New,
            lead_id: None,
            submitted_at: Utc::now(),
        }
    }
}

/// Unified view over submissions from either the CRM table or the
/// external forms database. External rows carry integer ids, so the id is
/// kept as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: String,
    pub form_type: String,
    pub name: String,
    pub email: String,
    pub company: String,
    pub submitted_at: DateTime<Utc>,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub status: SubmissionStatus,
    pub lead_id: Option<Uuid>,
}

impl From<Submission> for FormSubmission {
    fn from(sub: Submission) -> Self {
        Self {
            id: sub.id.to_string(),
            form_type: sub.form_type,
            name: sub.name,
            email: sub.email,
            company: sub.company.unwrap_or_default(),
            submitted_at: sub.submitted_at,
            data: sub.data,
            status: sub.status,
            lead_id: sub.lead_id,
        }
    }
}
