use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::visibility::owns_lead;
use crate::auth::{check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{ActionKind, ActivityLog, Capability};

/// Rows removed or detached alongside a deleted lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeletionCounts {
    pub call_logs: usize,
    pub reminders: usize,
    pub comments: usize,
    pub entity_tags: usize,
    pub submissions_updated: usize,
}

/// Delete a lead with its call logs, reminders, comments and tags.
/// Linked submissions are reopened rather than deleted.
pub fn delete_lead(db: &Database, actor: &Actor, lead_id: Uuid) -> AppResult<DeletionCounts> {
    check(&actor.permissions, Capability::Leads, Access::Write)?;

    let lead = db
        .get_lead(lead_id)?
        .ok_or_else(|| AppError::not_found("lead not found"))?;
    if !actor.is_supervisor() && !owns_lead(actor, &lead) {
        return Err(AppError::forbidden("not authorized to delete this lead"));
    }

    let counts = db.with_transaction(|tx| -> AppResult<DeletionCounts> {
        let counts = DeletionCounts {
            call_logs: tx.delete_call_logs_for_lead(lead.id)?,
            reminders: tx.delete_reminders_for_lead(lead.id)?,
            comments: tx.delete_comments_for_lead(lead.id)?,
            entity_tags: tx.delete_entity_tags_for("lead", lead.id)?,
            submissions_updated: tx.reset_submissions_for_lead(lead.id)?,
        };

        let log = ActivityLog::new(
            actor.id(),
            ActionKind::LeadDeleted,
            format!("Deleted lead {}: {} ({})", lead.id, lead.name, lead.email),
            "lead",
            Some(lead.id),
        )
        .with_metadata(json!({
            "lead_id": lead.id,
            "lead_name": lead.name,
            "lead_email": lead.email,
            "lead_company": lead.company,
            "related_data_deleted": counts,
        }));
        tx.insert_activity(&log)?;

        tx.delete_lead_row(lead.id)?;
        Ok(counts)
    })?;

    tracing::info!(lead_id = %lead.id, ?counts, "deleted lead");
    Ok(counts)
}
