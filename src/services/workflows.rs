//! Conversion with follow-up side effects, and the newsletter signup flow.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::activity;
use super::conversion::{convert, ConvertRequest};
use crate::auth::{check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Capability, EntityTag, Lead, Reminder, Tag};

pub const MARKETING_LEAD_TAG: &str = "Marketing Lead";
pub const MARKETING_LEAD_COLOR: &str = "#28C76F";
const NEWSLETTER: &str = "newsletter";

#[derive(Debug, Clone, Serialize)]
pub struct FollowUpOutcome {
    pub lead: Lead,
    pub reminder: Reminder,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsletterOutcome {
    pub tagged: bool,
    pub tag_id: Uuid,
    pub submission_id: Option<Uuid>,
}

/// Convert, log the confirmation email, follow up the next day.
pub fn demo_request(
    db: &Database,
    actor: &Actor,
    submission_id: Uuid,
    assigned_to_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> AppResult<FollowUpOutcome> {
    convert_with_follow_up(
        db,
        actor,
        submission_id,
        assigned_to_id,
        "confirmation",
        |name| format!("Follow up with {}", name),
        Duration::days(1),
        now,
    )
}

/// Convert, log the brochure email, follow up in two days.
pub fn brochure_download(
    db: &Database,
    actor: &Actor,
    submission_id: Uuid,
    assigned_to_id: Option<Uuid>,
    now: DateTime<Utc>,
) -> AppResult<FollowUpOutcome> {
    convert_with_follow_up(
        db,
        actor,
        submission_id,
        assigned_to_id,
        "brochure",
        |name| format!("Follow up after brochure: {}", name),
        Duration::days(2),
        now,
    )
}

#[allow(clippy::too_many_arguments)]
fn convert_with_follow_up(
    db: &Database,
    actor: &Actor,
    submission_id: Uuid,
    assigned_to_id: Option<Uuid>,
    email_type: &str,
    title: impl Fn(&str) -> String,
    due_in: Duration,
    now: DateTime<Utc>,
) -> AppResult<FollowUpOutcome> {
    check(&actor.permissions, Capability::ConvertToLead, Access::Write)?;

    let request = ConvertRequest {
        assigned_to_id,
        ..Default::default()
    };
    let (lead, submission, reminder) = convert(db, actor, submission_id, &request, now, |lead, sub| {
        let mut reminder = Reminder::new(
            lead.assigned_to.unwrap_or(actor.id()),
            title(&sub.name),
            now + due_in,
        );
        reminder.lead_id = Some(lead.id);
        reminder.created_at = now;
        Some(reminder)
    })?;
    let reminder =
        reminder.ok_or_else(|| AppError::Internal(anyhow::anyhow!("follow-up reminder missing")))?;

    activity::record(
        db,
        activity::email_sent(actor.id(), "lead", Some(lead.id), email_type, &submission.email)
            .at(now),
    );

    tracing::info!(lead_id = %lead.id, reminder_id = %reminder.id, email_type, "follow-up workflow done");
    Ok(FollowUpOutcome { lead, reminder })
}

/// Log the welcome email and tag the subscriber as a marketing lead.
pub fn newsletter_signup(
    db: &Database,
    actor: &Actor,
    email: &str,
    now: DateTime<Utc>,
) -> AppResult<NewsletterOutcome> {
    check(&actor.permissions, Capability::Submissions, Access::Write)?;
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::bad_request("email is required"));
    }

    activity::record(
        db,
        activity::email_sent(actor.id(), NEWSLETTER, None, "welcome", email).at(now),
    );

    let tag = match db.get_tag_by_name(MARKETING_LEAD_TAG)? {
        Some(tag) => tag,
        None => {
            let mut tag = Tag::new(MARKETING_LEAD_TAG.to_string());
            tag.color = MARKETING_LEAD_COLOR.to_string();
            tag.entity_type = Some(NEWSLETTER.to_string());
            tag.created_by = Some(actor.id());
            tag.created_at = now;
            db.insert_tag(&tag)?;
            tag
        }
    };

    let submission = db.find_submission_by_email(NEWSLETTER, email)?;
    if let Some(sub) = &submission {
        if !db.entity_tag_exists(tag.id, NEWSLETTER, sub.id)? {
            db.insert_entity_tag(&EntityTag::new(tag.id, NEWSLETTER.to_string(), sub.id))?;
        }
    }

    Ok(NewsletterOutcome {
        tagged: true,
        tag_id: tag.id,
        submission_id: submission.map(|s| s.id),
    })
}
