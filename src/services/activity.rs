//! Building and recording activity log entries.

use serde_json::json;
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::{ActivityFilter, Database};
use crate::error::AppResult;
use crate::models::{ActionKind, ActivityLog, Lead, Submission, User};

/// Hard ceiling on page size for activity listings.
pub const MAX_PAGE: u32 = 100;
pub const MAX_RECENT: u32 = 50;

/// Best effort insert. A failure is logged and otherwise ignored.
pub fn record(db: &Database, log: ActivityLog) {
    if let Err(e) = db.insert_activity(&log) {
        tracing::warn!(
            action = %log.action,
            entity_type = %log.entity_type,
            error = %e,
            "failed to record activity"
        );
    }
}

pub fn lead_converted(actor_id: Uuid, submission: &Submission, lead: &Lead) -> ActivityLog {
    ActivityLog::new(
        actor_id,
        ActionKind::LeadConverted,
        format!(
            "Converted form submission to lead {} (Form: {}, Name: {})",
            lead.id, submission.form_type, submission.name
        ),
        "lead",
        Some(lead.id),
    )
    .with_metadata(json!({
        "submission_id": submission.id,
        "lead_id": lead.id,
        "lead_name": lead.name,
        "form_type": submission.form_type,
    }))
}

pub fn lead_created(actor_id: Uuid, lead: &Lead) -> ActivityLog {
    ActivityLog::new(
        actor_id,
        ActionKind::LeadCreated,
        format!("Created lead {} ({})", lead.name, lead.email),
        "lead",
        Some(lead.id),
    )
    .with_metadata(json!({ "lead_id": lead.id, "lead_name": lead.name }))
}

pub fn status_changed(actor_id: Uuid, lead: &Lead, old_status: &str) -> ActivityLog {
    ActivityLog::new(
        actor_id,
        ActionKind::StatusChanged,
        format!(
            "Changed lead status from '{}' to '{}' (Lead: {})",
            old_status, lead.status, lead.name
        ),
        "lead",
        Some(lead.id),
    )
    .with_metadata(json!({
        "lead_id": lead.id,
        "lead_name": lead.name,
        "old_status": old_status,
        "new_status": lead.status,
    }))
}

pub fn lead_assigned(actor_id: Uuid, lead: &Lead) -> ActivityLog {
    ActivityLog::new(
        actor_id,
        ActionKind::LeadAssigned,
        format!("Assigned lead {} to {}", lead.name, lead.assigned),
        "lead",
        Some(lead.id),
    )
    .with_metadata(json!({
        "lead_id": lead.id,
        "assigned_to": lead.assigned_to,
        "assigned": lead.assigned,
    }))
}

pub fn comment_added(actor_id: Uuid, lead: &Lead, comment_id: Uuid) -> ActivityLog {
    ActivityLog::new(
        actor_id,
        ActionKind::CommentAdded,
        format!("Added comment to lead (Lead: {})", lead.name),
        "lead",
        Some(lead.id),
    )
    .with_metadata(json!({
        "lead_id": lead.id,
        "lead_name": lead.name,
        "comment_id": comment_id,
    }))
}

/// `user_created`, `user_updated` or `user_deleted`.
pub fn user_action(actor_id: Uuid, action: ActionKind, target: &User) -> ActivityLog {
    let verb = match action {
        ActionKind::UserCreated => "Created new user",
        ActionKind::UserDeleted => "Deleted user",
        _ => "Updated user",
    };
    ActivityLog::new(
        actor_id,
        action,
        format!("{}: {}", verb, target.name),
        "user",
        Some(target.id),
    )
    .with_metadata(json!({
        "target_user_id": target.id,
        "target_user_name": target.name,
    }))
}

pub fn login(user: &User) -> ActivityLog {
    ActivityLog::new(
        user.id,
        ActionKind::Login,
        "User logged in successfully".to_string(),
        "user",
        Some(user.id),
    )
    .with_metadata(json!({ "success": true, "user_email": user.email }))
}

pub fn email_sent(
    actor_id: Uuid,
    entity_type: &str,
    entity_id: Option<Uuid>,
    email_type: &str,
    recipient: &str,
) -> ActivityLog {
    ActivityLog::new(
        actor_id,
        ActionKind::EmailSent,
        format!("Logged {} email to {}", email_type, recipient),
        entity_type,
        entity_id,
    )
    .with_metadata(json!({ "email_type": email_type, "recipient": recipient }))
}

/// Admins and Sales Managers see every entry; everyone else only their own.
pub fn list_for(db: &Database, actor: &Actor, mut filter: ActivityFilter) -> AppResult<Vec<ActivityLog>> {
    if !actor.is_supervisor() {
        filter.user_id = Some(actor.id());
    }
    filter.limit = filter.limit.min(MAX_PAGE);
    Ok(db.list_activities(&filter)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::Fixture;

    #[test]
    fn test_non_supervisors_only_see_their_own() {
        let fx = Fixture::new();
        let exec = fx.executive("Eli", Some(fx.manager.id()));
        record(&fx.db, login(&fx.admin.user));
        record(&fx.db, login(&exec.user));

        let all = list_for(&fx.db, &fx.manager, ActivityFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let own = list_for(&fx.db, &exec, ActivityFilter::default()).unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].user_id, exec.id());
    }

    #[test]
    fn test_limit_is_capped() {
        let fx = Fixture::new();
        for _ in 0..3 {
            record(&fx.db, login(&fx.admin.user));
        }
        let filter = ActivityFilter {
            limit: 10_000,
            ..Default::default()
        };
        assert_eq!(list_for(&fx.db, &fx.admin, filter).unwrap().len(), 3);
    }
}
