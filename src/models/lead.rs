use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Display name stored in `assigned` when nobody owns the lead.
pub const UNASSIGNED: &str = "Unassigned";
pub const STATUS_NEW: &str = "New";
pub const SOURCE_TYPE_WEBSITE: &str = "Website";

/// Statuses that count as a won deal in reports.
pub const WON_STATUSES: [&str; 2] = ["Closed Won", "Won"];
/// Statuses the inactivity sweep leaves alone.
pub const CLOSED_STATUSES: [&str; 4] = ["Closed Won", "Closed Lost", "Won", "Lost"];

/// Pipeline stage, A through H.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Stage {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
            Self::G => "G",
            Self::H => "H",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            "G" => Ok(Self::G),
            "H" => Ok(Self::H),
            _ => Err(format!("invalid stage '{}': must be one of A-H", s)),
        }
    }
}

impl TryFrom<String> for Stage {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.as_str().to_string()
    }
}

/// Shared by lead follow-ups and reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FollowUpStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl FollowUpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for FollowUpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FollowUpStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            _ => Err(format!(
                "invalid status '{}': must be Pending, Completed or Cancelled",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub status: String,
    pub stage: Option<Stage>,
    pub assigned_to: Option<Uuid>,
    /// Denormalized assignee name, kept in step with `assigned_to`.
    pub assigned: String,
    pub created_by: Option<Uuid>,
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    /// "HH:MM"
    pub follow_up_time: Option<String>,
    pub follow_up_status: FollowUpStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone: None,
            company: None,
            designation: None,
            source_type: None,
            source: None,
            status: STATUS_NEW.to_string(),
            stage: None,
            assigned_to: None,
            assigned: UNASSIGNED.to_string(),
            created_by: None,
            follow_up_required: false,
            follow_up_date: None,
            follow_up_time: None,
            follow_up_status: FollowUpStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assign(&mut self, user_id: Uuid, user_name: &str) {
        self.assigned_to = Some(user_id);
        self.assigned = user_name.to_string();
    }

    pub fn unassign(&mut self) {
        self.assigned_to = None;
        self.assigned = UNASSIGNED.to_string();
    }

    pub fn is_closed(&self) -> bool {
        CLOSED_STATUSES.contains(&self.status.as_str())
    }

    pub fn is_won(&self) -> bool {
        WON_STATUSES.contains(&self.status.as_str())
    }
}
