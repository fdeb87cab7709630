//! Reminders and call logs. Both belong to a user; only admins see or touch
//! other people's entries.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::leads::{may_touch_lead, parse_stage};
use crate::auth::{check, Access, Actor};
use crate::db::{CallLogFilter, Database, ReminderFilter};
use crate::error::{AppError, AppResult};
use crate::models::{CallLog, Capability, FollowUpStatus, Lead, Reminder};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderQuery {
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub completed: Option<bool>,
    #[serde(default)]
    pub upcoming_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReminder {
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallLogQuery {
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallLogFields {
    pub stage: Option<String>,
    pub activity_type: Option<String>,
    pub objective: Option<String>,
    pub planning_notes: Option<String>,
    pub post_meeting_notes: Option<String>,
    pub follow_up_notes: Option<String>,
    pub challenges: Option<String>,
    pub secured_order: Option<bool>,
    pub dollar_value: Option<f64>,
    pub meeting_date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
    pub is_cancelled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCallLog {
    pub lead_id: Uuid,
    pub user_id: Option<Uuid>,
    #[serde(flatten)]
    pub fields: CallLogFields,
}

fn parse_status(status: &str) -> AppResult<FollowUpStatus> {
    status.parse().map_err(AppError::BadRequest)
}

/// A lead the actor may attach follow-ups to.
fn writable_lead(db: &Database, actor: &Actor, lead_id: Uuid, what: &str) -> AppResult<Lead> {
    let lead = db
        .get_lead(lead_id)?
        .ok_or_else(|| AppError::not_found("lead not found"))?;
    if !may_touch_lead(actor, &lead) {
        return Err(AppError::forbidden(format!(
            "you can only create {} for leads assigned to you",
            what
        )));
    }
    Ok(lead)
}

fn check_owner(actor: &Actor, owner: Uuid, what: &str) -> AppResult<()> {
    if actor.is_admin() || owner == actor.id() {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("not authorized to access this {}", what)))
    }
}

pub fn list_reminders(
    db: &Database,
    actor: &Actor,
    query: &ReminderQuery,
    now: DateTime<Utc>,
) -> AppResult<Vec<Reminder>> {
    check(&actor.permissions, Capability::Reminders, Access::Read)?;
    let user_id = if actor.is_admin() {
        query.user_id
    } else {
        Some(actor.id())
    };
    let mut filter = ReminderFilter {
        lead_id: query.lead_id,
        user_id,
        completed: query.completed,
        due_from: None,
    };
    if query.upcoming_only {
        filter.completed = Some(false);
        filter.due_from = Some(now);
    }
    Ok(db.list_reminders(&filter)?)
}

pub fn upcoming_reminders(db: &Database, actor: &Actor, now: DateTime<Utc>) -> AppResult<Vec<Reminder>> {
    let filter = ReminderFilter {
        user_id: Some(actor.id()),
        completed: Some(false),
        due_from: Some(now),
        ..Default::default()
    };
    Ok(db.list_reminders(&filter)?)
}

pub fn create_reminder(
    db: &Database,
    actor: &Actor,
    request: &NewReminder,
    now: DateTime<Utc>,
) -> AppResult<Reminder> {
    let status = request.status.as_deref().map(parse_status).transpose()?;
    if request.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }
    if let Some(lead_id) = request.lead_id {
        writable_lead(db, actor, lead_id, "reminders")?;
    }

    let owner = request.user_id.unwrap_or_else(|| actor.id());
    if owner != actor.id() && db.get_user(owner)?.is_none() {
        return Err(AppError::not_found("user not found"));
    }
    let mut reminder = Reminder::new(owner, request.title.trim().to_string(), request.due_date);
    reminder.lead_id = request.lead_id;
    reminder.description = request.description.clone();
    reminder.created_at = now;
    if let Some(status) = status {
        reminder.set_status(status, now);
    }
    db.insert_reminder(&reminder)?;
    Ok(reminder)
}

pub fn get_reminder(db: &Database, actor: &Actor, id: Uuid) -> AppResult<Reminder> {
    let reminder = db
        .get_reminder(id)?
        .ok_or_else(|| AppError::not_found("reminder not found"))?;
    check_owner(actor, reminder.user_id, "reminder")?;
    Ok(reminder)
}

pub fn update_reminder(
    db: &Database,
    actor: &Actor,
    id: Uuid,
    patch: &ReminderPatch,
    now: DateTime<Utc>,
) -> AppResult<Reminder> {
    check(&actor.permissions, Capability::Reminders, Access::Write)?;
    let mut reminder = get_reminder(db, actor, id)?;
    let status = patch.status.as_deref().map(parse_status).transpose()?;

    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(AppError::bad_request("title cannot be empty"));
        }
        reminder.title = title.trim().to_string();
    }
    if let Some(description) = &patch.description {
        reminder.description = Some(description.clone());
    }
    if let Some(due) = patch.due_date {
        reminder.due_date = due;
    }

    let was_completed = reminder.completed;
    let completed_at = reminder.completed_at;
    if let Some(status) = status {
        reminder.set_status(status, now);
    } else if let Some(completed) = patch.completed {
        reminder.set_completed(completed, now);
    }
    // Re-completing keeps the original completion time.
    if was_completed && reminder.completed {
        reminder.completed_at = completed_at;
    }

    db.update_reminder(&reminder)?;
    Ok(reminder)
}

pub fn delete_reminder(db: &Database, actor: &Actor, id: Uuid) -> AppResult<()> {
    check(&actor.permissions, Capability::Reminders, Access::Write)?;
    let reminder = get_reminder(db, actor, id)?;
    db.delete_reminder(reminder.id)?;
    Ok(())
}

pub fn list_call_logs(db: &Database, actor: &Actor, query: &CallLogQuery) -> AppResult<Vec<CallLog>> {
    let user_id = if actor.is_admin() {
        query.user_id
    } else {
        Some(actor.id())
    };
    let filter = CallLogFilter {
        lead_id: query.lead_id,
        user_id,
    };
    Ok(db.list_call_logs(&filter)?)
}

fn apply_fields(log: &mut CallLog, fields: &CallLogFields) -> AppResult<()> {
    if let Some(stage) = &fields.stage {
        log.stage = Some(parse_stage(stage)?);
    }
    if let Some(v) = &fields.activity_type {
        log.activity_type = Some(v.clone());
    }
    if let Some(v) = &fields.objective {
        log.objective = Some(v.clone());
    }
    if let Some(v) = &fields.planning_notes {
        log.planning_notes = Some(v.clone());
    }
    if let Some(v) = &fields.post_meeting_notes {
        log.post_meeting_notes = Some(v.clone());
    }
    if let Some(v) = &fields.follow_up_notes {
        log.follow_up_notes = Some(v.clone());
    }
    if let Some(v) = &fields.challenges {
        log.challenges = Some(v.clone());
    }
    if let Some(v) = fields.secured_order {
        log.secured_order = v;
    }
    if let Some(v) = fields.dollar_value {
        log.dollar_value = Some(v);
    }
    if let Some(v) = fields.meeting_date {
        log.meeting_date = Some(v);
    }
    if let Some(v) = fields.is_completed {
        log.is_completed = v;
    }
    if let Some(v) = fields.is_cancelled {
        log.is_cancelled = v;
    }
    Ok(())
}

/// Records the call and moves the lead to the call's stage, if one was given.
pub fn create_call_log(
    db: &Database,
    actor: &Actor,
    request: &NewCallLog,
    now: DateTime<Utc>,
) -> AppResult<CallLog> {
    let lead = writable_lead(db, actor, request.lead_id, "call logs")?;
    let mut log = CallLog::new(lead.id, request.user_id.unwrap_or_else(|| actor.id()));
    apply_fields(&mut log, &request.fields)?;
    log.created_at = now;
    log.updated_at = now;

    db.with_transaction(|tx| -> AppResult<()> {
        tx.insert_call_log(&log)?;
        if let Some(stage) = log.stage {
            tx.set_lead_stage(lead.id, stage)?;
        }
        Ok(())
    })?;
    Ok(log)
}

pub fn get_call_log(db: &Database, actor: &Actor, id: Uuid) -> AppResult<CallLog> {
    let log = db
        .get_call_log(id)?
        .ok_or_else(|| AppError::not_found("call log not found"))?;
    check_owner(actor, log.user_id, "call log")?;
    Ok(log)
}

pub fn update_call_log(
    db: &Database,
    actor: &Actor,
    id: Uuid,
    fields: &CallLogFields,
    now: DateTime<Utc>,
) -> AppResult<CallLog> {
    check(&actor.permissions, Capability::Leads, Access::Write)?;
    let mut log = get_call_log(db, actor, id)?;
    apply_fields(&mut log, fields)?;
    log.updated_at = now;

    db.with_transaction(|tx| -> AppResult<()> {
        tx.update_call_log(&log)?;
        if let (Some(stage), true) = (log.stage, fields.stage.is_some()) {
            tx.set_lead_stage(log.lead_id, stage)?;
        }
        Ok(())
    })?;
    Ok(log)
}

pub fn delete_call_log(db: &Database, actor: &Actor, id: Uuid) -> AppResult<()> {
    check(&actor.permissions, Capability::Leads, Access::Write)?;
    let log = get_call_log(db, actor, id)?;
    db.delete_call_log(log.id)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Stage, ROLE_MARKETING};
    use crate::services::testing::Fixture;
    use chrono::Duration;

    fn reminder_req(lead_id: Option<Uuid>, due: DateTime<Utc>) -> NewReminder {
        NewReminder {
            lead_id,
            user_id: None,
            title: "Call back".into(),
            description: None,
            due_date: due,
            status: None,
        }
    }

    #[test]
    fn test_non_admins_see_own_reminders() {
        let fx = Fixture::new();
        let eli = fx.executive("Eli", None);
        let now = Utc::now();
        create_reminder(&fx.db, &eli, &reminder_req(None, now + Duration::days(1)), now).unwrap();
        create_reminder(&fx.db, &fx.admin, &reminder_req(None, now + Duration::days(1)), now).unwrap();

        let query = ReminderQuery {
            user_id: Some(fx.admin.id()),
            ..Default::default()
        };
        let mine = list_reminders(&fx.db, &eli, &query, now).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].user_id, eli.id());
        assert_eq!(list_reminders(&fx.db, &fx.admin, &ReminderQuery::default(), now).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_status_is_bad_request() {
        let fx = Fixture::new();
        let mut req = reminder_req(None, Utc::now());
        req.status = Some("Snoozed".into());
        assert!(matches!(
            create_reminder(&fx.db, &fx.admin, &req, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_reminder_on_foreign_lead_forbidden() {
        let fx = Fixture::new();
        let marketer = fx.user("Mark", ROLE_MARKETING, None);
        let lead = fx.lead_for("Acme", None);
        let err = create_reminder(&fx.db, &marketer, &reminder_req(Some(lead.id), Utc::now()), Utc::now())
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        let err = create_reminder(
            &fx.db,
            &marketer,
            &reminder_req(Some(Uuid::new_v4()), Utc::now()),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_update_status_syncs_completion() {
        let fx = Fixture::new();
        let eli = fx.executive("Eli", None);
        let now = Utc::now();
        let r = create_reminder(&fx.db, &eli, &reminder_req(None, now), now).unwrap();

        let done = ReminderPatch {
            status: Some("Completed".into()),
            ..Default::default()
        };
        let updated = update_reminder(&fx.db, &eli, r.id, &done, now).unwrap();
        assert!(updated.completed);
        assert_eq!(updated.completed_at, Some(now));

        let later = now + Duration::hours(1);
        let again = update_reminder(&fx.db, &eli, r.id, &done, later).unwrap();
        assert_eq!(again.completed_at, Some(now));

        let reopen = ReminderPatch {
            completed: Some(false),
            ..Default::default()
        };
        let reopened = update_reminder(&fx.db, &eli, r.id, &reopen, later).unwrap();
        assert_eq!(reopened.status, FollowUpStatus::Pending);
        assert!(reopened.completed_at.is_none());

        let other = fx.executive("Eve", None);
        assert!(matches!(
            update_reminder(&fx.db, &other, r.id, &done, now).unwrap_err(),
            AppError::Forbidden(_)
        ));
    }

    #[test]
    fn test_upcoming_reminders() {
        let fx = Fixture::new();
        let now = Utc::now();
        create_reminder(&fx.db, &fx.admin, &reminder_req(None, now - Duration::days(1)), now).unwrap();
        let soon = create_reminder(&fx.db, &fx.admin, &reminder_req(None, now + Duration::days(1)), now)
            .unwrap();
        let upcoming = upcoming_reminders(&fx.db, &fx.admin, now).unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, soon.id);
    }

    #[test]
    fn test_call_log_stage_moves_lead() {
        let fx = Fixture::new();
        let eli = fx.executive("Eli", None);
        let lead = fx.lead_for("Acme", Some(&eli));
        let req = NewCallLog {
            lead_id: lead.id,
            user_id: None,
            fields: CallLogFields {
                stage: Some("D".into()),
                activity_type: Some("Phone Call".into()),
                ..Default::default()
            },
        };
        let log = create_call_log(&fx.db, &eli, &req, Utc::now()).unwrap();
        assert_eq!(log.user_id, eli.id());
        assert_eq!(fx.db.get_lead(lead.id).unwrap().unwrap().stage, Some(Stage::D));

        let patch = CallLogFields {
            stage: Some("E".into()),
            ..Default::default()
        };
        update_call_log(&fx.db, &eli, log.id, &patch, Utc::now()).unwrap();
        assert_eq!(fx.db.get_lead(lead.id).unwrap().unwrap().stage, Some(Stage::E));

        let bad = CallLogFields {
            stage: Some("Q".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_call_log(&fx.db, &eli, log.id, &bad, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_call_log_ownership() {
        let fx = Fixture::new();
        let eli = fx.executive("Eli", None);
        let eve = fx.executive("Eve", None);
        let lead = fx.lead_for("Acme", Some(&eli));
        let req = NewCallLog {
            lead_id: lead.id,
            user_id: None,
            fields: CallLogFields::default(),
        };
        let log = create_call_log(&fx.db, &eli, &req, Utc::now()).unwrap();

        assert!(matches!(
            get_call_log(&fx.db, &eve, log.id).unwrap_err(),
            AppError::Forbidden(_)
        ));
        assert!(list_call_logs(&fx.db, &eve, &CallLogQuery::default()).unwrap().is_empty());
        assert_eq!(list_call_logs(&fx.db, &fx.admin, &CallLogQuery::default()).unwrap().len(), 1);

        delete_call_log(&fx.db, &eli, log.id).unwrap();
        assert!(fx.db.get_call_log(log.id).unwrap().is_none());
    }
}
