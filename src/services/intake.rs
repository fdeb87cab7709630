//! Website form intake: submissions, newsletter subscribers and the form
//! field catalogue.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::{check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    Capability, FieldType, FormField, FormSubmission, NewsletterEntry, Submission,
    SubmissionStatus,
};
use crate::sources::SubmissionSource;

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub form_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub company: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionFilter {
    pub form_type: String,
    #[serde(default)]
    pub filters: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusPatch {
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNewsletterEntry {
    pub email: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFormField {
    pub form_type: String,
    pub field_name: String,
    pub field_label: String,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    pub options: Option<String>,
}

/// Public intake; no caller identity.
pub fn submit(db: &Database, request: &NewSubmission, now: DateTime<Utc>) -> AppResult<Submission> {
    let form_type = request.form_type.trim();
    if form_type.is_empty() {
        return Err(AppError::bad_request("form_type is required"));
    }
    let mut sub = Submission::new(
        form_type.to_string(),
        request.name.trim().to_string(),
        request.email.trim().to_string(),
    );
    sub.company = request.company.clone();
    sub.data = request.data.clone();
    sub.submitted_at = now;
    db.insert_submission(&sub)?;
    tracing::info!(submission_id = %sub.id, form_type = %sub.form_type, "received submission");
    Ok(sub)
}

pub fn list_submissions(
    db: &Database,
    actor: &Actor,
    form_type: Option<&str>,
) -> AppResult<Vec<Submission>> {
    check(&actor.permissions, Capability::Submissions, Access::Read)?;
    let types: Vec<&str> = form_type.map(|t| vec![t]).unwrap_or_default();
    Ok(db.list_submissions(&types)?)
}

pub fn get_submission(db: &Database, actor: &Actor, id: Uuid) -> AppResult<Submission> {
    check(&actor.permissions, Capability::Submissions, Access::Read)?;
    db.get_submission(id)?
        .ok_or_else(|| AppError::not_found("submission not found"))
}

/// Text form of a JSON value for equality filtering: strings bare, the rest
/// as JSON.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Submissions of one form type whose `data` matches every filter exactly.
pub fn filter_submissions(
    db: &Database,
    actor: &Actor,
    request: &SubmissionFilter,
) -> AppResult<Vec<Submission>> {
    check(&actor.permissions, Capability::Submissions, Access::Read)?;
    let subs = db.list_submissions(&[request.form_type.as_str()])?;
    Ok(subs
        .into_iter()
        .filter(|sub| {
            request.filters.iter().all(|(key, wanted)| {
                sub.data
                    .get(key)
                    .is_some_and(|v| as_text(v) == as_text(wanted))
            })
        })
        .collect())
}

pub fn set_submission_status(
    db: &Database,
    actor: &Actor,
    id: Uuid,
    patch: &StatusPatch,
) -> AppResult<Submission> {
    check(&actor.permissions, Capability::Submissions, Access::Write)?;
    let status: SubmissionStatus = patch.status.parse().map_err(AppError::BadRequest)?;
    let mut sub = db
        .get_submission(id)?
        .ok_or_else(|| AppError::not_found("submission not found"))?;
    db.set_submission_status(sub.id, status, sub.lead_id)?;
    sub.status = status;
    Ok(sub)
}

pub fn delete_submission(db: &Database, actor: &Actor, id: Uuid) -> AppResult<()> {
    check(&actor.permissions, Capability::DeleteSubmission, Access::Write)?;
    if !db.delete_submission(id)? {
        return Err(AppError::not_found("submission not found"));
    }
    tracing::info!(submission_id = %id, "deleted submission");
    Ok(())
}

/// Unified submissions from whichever source the server was started with.
pub fn form_submissions(
    source: &dyn SubmissionSource,
    actor: &Actor,
    form_type: Option<&str>,
) -> AppResult<Vec<FormSubmission>> {
    check(&actor.permissions, Capability::Submissions, Access::Read)?;
    source.list(form_type)
}

pub fn list_newsletter(db: &Database) -> AppResult<Vec<NewsletterEntry>> {
    Ok(db.list_newsletter_entries()?)
}

pub fn add_newsletter_entry(db: &Database, request: &NewNewsletterEntry) -> AppResult<NewsletterEntry> {
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AppError::bad_request("email is required"));
    }
    if db
        .list_newsletter_entries()?
        .iter()
        .any(|e| e.email.eq_ignore_ascii_case(email))
    {
        return Err(AppError::bad_request("email already subscribed"));
    }
    let entry = NewsletterEntry::new(email.to_string(), request.date.clone());
    db.insert_newsletter_entry(&entry)?;
    Ok(entry)
}

/// Flip the active flag.
pub fn toggle_newsletter_entry(db: &Database, id: Uuid) -> AppResult<NewsletterEntry> {
    let mut entry = db
        .get_newsletter_entry(id)?
        .ok_or_else(|| AppError::not_found("newsletter entry not found"))?;
    entry.active = !entry.active;
    db.set_newsletter_active(entry.id, entry.active)?;
    Ok(entry)
}

pub fn form_fields(db: &Database, form_type: &str) -> AppResult<Vec<FormField>> {
    Ok(db.list_form_fields(form_type)?)
}

pub fn add_form_field(db: &Database, actor: &Actor, request: &NewFormField) -> AppResult<FormField> {
    check(&actor.permissions, Capability::Configuration, Access::Write)?;
    if request.form_type.trim().is_empty() || request.field_name.trim().is_empty() {
        return Err(AppError::bad_request("form_type and field_name are required"));
    }
    let field = FormField {
        id: Uuid::new_v4(),
        form_type: request.form_type.trim().to_string(),
        field_name: request.field_name.trim().to_string(),
        field_label: request.field_label.clone(),
        field_type: request.field_type,
        required: request.required,
        options: request.options.clone(),
    };
    db.insert_form_field(&field)?;
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ROLE_MARKETING, ROLE_SALES_EXECUTIVE};
    use crate::services::testing::Fixture;
    use serde_json::json;

    fn intake(fx: &Fixture, form_type: &str, data: Value) -> Submission {
        let req = NewSubmission {
            form_type: form_type.into(),
            name: "Dana".into(),
            email: "dana@co.test".into(),
            company: None,
            data: data.as_object().cloned().unwrap_or_default(),
        };
        submit(&fx.db, &req, Utc::now()).unwrap()
    }

    #[test]
    fn test_public_intake_requires_form_type() {
        let fx = Fixture::new();
        let req = NewSubmission {
            form_type: "  ".into(),
            name: String::new(),
            email: String::new(),
            company: None,
            data: Map::new(),
        };
        assert!(matches!(
            submit(&fx.db, &req, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_filter_matches_data_exactly() {
        let fx = Fixture::new();
        intake(&fx, "demo", json!({"country": "NZ", "seats": 10}));
        intake(&fx, "demo", json!({"country": "AU", "seats": 10}));
        intake(&fx, "contact", json!({"country": "NZ"}));

        let req = SubmissionFilter {
            form_type: "demo".into(),
            filters: json!({"country": "NZ"}).as_object().cloned().unwrap(),
        };
        assert_eq!(filter_submissions(&fx.db, &fx.admin, &req).unwrap().len(), 1);

        let req = SubmissionFilter {
            form_type: "demo".into(),
            filters: json!({"seats": "10"}).as_object().cloned().unwrap(),
        };
        assert_eq!(filter_submissions(&fx.db, &fx.admin, &req).unwrap().len(), 2);
    }

    #[test]
    fn test_submission_permissions() {
        let fx = Fixture::new();
        let sub = intake(&fx, "demo", json!({}));
        let exec = fx.user("Eli", ROLE_SALES_EXECUTIVE, None);
        assert!(matches!(
            list_submissions(&fx.db, &exec, None).unwrap_err(),
            AppError::Forbidden(_)
        ));
        let marketer = fx.user("Mark", ROLE_MARKETING, None);
        assert_eq!(list_submissions(&fx.db, &marketer, Some("demo")).unwrap().len(), 1);
        assert!(matches!(
            delete_submission(&fx.db, &marketer, sub.id).unwrap_err(),
            AppError::Forbidden(_)
        ));
        delete_submission(&fx.db, &fx.admin, sub.id).unwrap();
        assert!(matches!(
            get_submission(&fx.db, &fx.admin, sub.id).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_status_patch() {
        let fx = Fixture::new();
        let sub = intake(&fx, "demo", json!({}));
        let archived = set_submission_status(
            &fx.db,
            &fx.admin,
            sub.id,
            &StatusPatch {
                status: "Archived".into(),
            },
        )
        .unwrap();
        assert_eq!(archived.status, SubmissionStatus::Archived);
        let bad = StatusPatch {
            status: "Gone".into(),
        };
        assert!(matches!(
            set_submission_status(&fx.db, &fx.admin, sub.id, &bad).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_newsletter_toggle() {
        let fx = Fixture::new();
        let req = NewNewsletterEntry {
            email: "reader@news.test".into(),
            date: None,
        };
        let entry = add_newsletter_entry(&fx.db, &req).unwrap();
        assert!(entry.active);
        assert!(matches!(
            add_newsletter_entry(&fx.db, &req).unwrap_err(),
            AppError::BadRequest(_)
        ));
        assert!(!toggle_newsletter_entry(&fx.db, entry.id).unwrap().active);
        assert!(toggle_newsletter_entry(&fx.db, entry.id).unwrap().active);
    }

    #[test]
    fn test_form_fields_need_configuration() {
        let fx = Fixture::new();
        let req = NewFormField {
            form_type: "demo".into(),
            field_name: "seats".into(),
            field_label: "Seats".into(),
            field_type: FieldType::Number,
            required: true,
            options: None,
        };
        // admin role does not carry `configuration`, but `all` covers it
        add_form_field(&fx.db, &fx.admin, &req).unwrap();
        assert!(matches!(
            add_form_field(&fx.db, &fx.manager, &req).unwrap_err(),
            AppError::Forbidden(_)
        ));
        assert_eq!(form_fields(&fx.db, "demo").unwrap().len(), 1);
    }
}
