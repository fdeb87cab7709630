//! Follow-up reminders for leads nobody has touched in a while.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::activity;
use crate::auth::{check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{ActionKind, ActivityLog, Capability, Lead, Reminder, RoleTier};

/// Days without activity before a reminder is raised.
pub const REMIND_AFTER_DAYS: i64 = 7;
/// Days without activity before the reminder goes to a Sales Manager.
pub const ESCALATE_AFTER_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InactivityOutcome {
    Active {
        days_inactive: i64,
    },
    Processed {
        days_inactive: i64,
        reminder_created: bool,
        reminder_id: Uuid,
        reminder_user_id: Uuid,
        escalated: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub lead_id: Uuid,
    pub lead_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InactivityOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub processed: Vec<BatchEntry>,
}

/// Whole days since the newest activity on the lead, or since it was created.
pub fn days_inactive(db: &Database, lead: &Lead, now: DateTime<Utc>) -> AppResult<i64> {
    let since = db
        .latest_activity_at("lead", lead.id)?
        .unwrap_or(lead.created_at);
    Ok((now - since).num_days())
}

pub fn process_lead(
    db: &Database,
    actor: &Actor,
    lead_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<InactivityOutcome> {
    check(&actor.permissions, Capability::Leads, Access::Write)?;
    let lead = db
        .get_lead(lead_id)?
        .ok_or_else(|| AppError::not_found("lead not found"))?;
    let days = days_inactive(db, &lead, now)?;
    escalate(db, actor, &lead, days, now)
}

/// Run the per-lead rule over every open lead that has gone quiet.
/// One failing lead does not stop the rest.
pub fn process_all(db: &Database, actor: &Actor, now: DateTime<Utc>) -> AppResult<BatchSummary> {
    check(&actor.permissions, Capability::Leads, Access::Write)?;

    let mut processed = Vec::new();
    for lead in db.list_open_leads()? {
        let outcome = days_inactive(db, &lead, now).and_then(|days| {
            if days < REMIND_AFTER_DAYS {
                return Ok(None);
            }
            escalate(db, actor, &lead, days, now).map(Some)
        });

        match outcome {
            Ok(None) => {}
            Ok(Some(result)) => processed.push(BatchEntry {
                lead_id: lead.id,
                lead_name: lead.name.clone(),
                result: Some(result),
                error: None,
            }),
            Err(e) => {
                tracing::warn!(lead_id = %lead.id, error = %e, "inactive lead processing failed");
                processed.push(BatchEntry {
                    lead_id: lead.id,
                    lead_name: lead.name.clone(),
                    result: None,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    tracing::info!(count = processed.len(), "processed inactive leads");
    Ok(BatchSummary { processed })
}

fn escalate(
    db: &Database,
    actor: &Actor,
    lead: &Lead,
    days: i64,
    now: DateTime<Utc>,
) -> AppResult<InactivityOutcome> {
    if days < REMIND_AFTER_DAYS {
        return Ok(InactivityOutcome::Active {
            days_inactive: days,
        });
    }

    let default_recipient = lead.assigned_to.unwrap_or(actor.id());
    let (recipient, escalated) = if days >= ESCALATE_AFTER_DAYS {
        match first_sales_manager(db)? {
            Some(manager) => (manager, true),
            None => (default_recipient, false),
        }
    } else {
        (default_recipient, false)
    };

    let mut reminder = Reminder::new(
        recipient,
        format!("Inactive lead: {} ({} days)", lead.name, days),
        now + Duration::days(1),
    );
    reminder.lead_id = Some(lead.id);
    reminder.created_at = now;

    let log = ActivityLog::new(
        actor.id(),
        ActionKind::InactiveLeadProcessed,
        format!("Processed inactive lead {} ({} days)", lead.name, days),
        "lead",
        Some(lead.id),
    )
    .with_metadata(json!({
        "days_inactive": days,
        "reminder_created": true,
        "escalated": escalated,
    }))
    .at(now);

    db.insert_reminder(&reminder)?;
    activity::record(db, log);

    Ok(InactivityOutcome::Processed {
        days_inactive: days,
        reminder_created: true,
        reminder_id: reminder.id,
        reminder_user_id: recipient,
        escalated,
    })
}

fn first_sales_manager(db: &Database) -> AppResult<Option<Uuid>> {
    let Some(level) = RoleTier::SalesManager.level() else {
        return Ok(None);
    };
    Ok(db.list_users_at_level(level)?.first().map(|u| u.id))
}
