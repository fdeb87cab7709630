use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::{activity, assignment, normalize};
use crate::auth::{check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    Capability, Lead, Reminder, Submission, SubmissionStatus, SOURCE_TYPE_WEBSITE,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConvertRequest {
    pub assigned_to_id: Option<Uuid>,
    /// Legacy assignment by display name.
    pub assigned: Option<String>,
    pub designation: Option<String>,
}

/// Turn a website submission into a lead and mark the submission converted.
pub fn convert_submission(
    db: &Database,
    actor: &Actor,
    submission_id: Uuid,
    request: &ConvertRequest,
    now: DateTime<Utc>,
) -> AppResult<Lead> {
    check(&actor.permissions, Capability::ConvertToLead, Access::Write)?;
    let (lead, _, _) = convert(db, actor, submission_id, request, now, |_, _| None)?;
    Ok(lead)
}

/// Shared by the plain conversion and the follow-up workflows. A reminder
/// returned by `follow_up` is stored in the same transaction as the lead.
pub(crate) fn convert<F>(
    db: &Database,
    actor: &Actor,
    submission_id: Uuid,
    request: &ConvertRequest,
    now: DateTime<Utc>,
    follow_up: F,
) -> AppResult<(Lead, Submission, Option<Reminder>)>
where
    F: FnOnce(&Lead, &Submission) -> Option<Reminder>,
{
    let submission = db
        .get_submission(submission_id)?
        .ok_or_else(|| AppError::not_found("submission not found"))?;
    if submission.status == SubmissionStatus::Converted {
        return Err(AppError::bad_request("submission has already been converted"));
    }

    let assignee = assignment::resolve(
        db,
        actor,
        request.assigned_to_id,
        request.assigned.as_deref(),
    )?;

    let mut lead = Lead::new(submission.name.clone(), submission.email.clone());
    lead.company = submission.company.clone();
    lead.designation = request.designation.clone();
    lead.source_type = Some(SOURCE_TYPE_WEBSITE.to_string());
    lead.source = Some(normalize::source_for_form_type(&submission.form_type).to_string());
    lead.created_by = Some(actor.id());
    lead.created_at = now;
    lead.updated_at = now;
    if let Some(user) = &assignee {
        lead.assign(user.id, &user.name);
    }
    let reminder = follow_up(&lead, &submission);

    db.with_transaction(|tx| -> AppResult<()> {
        tx.insert_lead(&lead)?;
        tx.set_submission_status(submission.id, SubmissionStatus::Converted, Some(lead.id))?;
        if let Some(reminder) = &reminder {
            tx.insert_reminder(reminder)?;
        }
        Ok(())
    })?;

    tracing::info!(
        submission_id = %submission.id,
        lead_id = %lead.id,
        assigned = %lead.assigned,
        "converted submission to lead"
    );
    activity::record(db, activity::lead_converted(actor.id(), &submission, &lead).at(now));

    Ok((normalize::normalized(lead), submission, reminder))
}
