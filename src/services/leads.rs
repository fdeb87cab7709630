//! Lead CRUD and lead comments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::{activity, assignment, deletion, normalize, visibility};
use crate::auth::{allows, check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Capability, Comment, FollowUpStatus, Lead, Stage, User};

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewLead {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub stage: Option<String>,
    pub assigned_to_id: Option<Uuid>,
    pub assigned: Option<String>,
    #[serde(default)]
    pub follow_up_required: bool,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_time: Option<String>,
}

/// Partial update. `assigned_to_id: null` unassigns; an absent field leaves
/// the assignment alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub designation: Option<String>,
    pub source_type: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to_id: Option<Option<Uuid>>,
    pub assigned: Option<String>,
    pub follow_up_required: Option<bool>,
    pub follow_up_date: Option<NaiveDate>,
    pub follow_up_time: Option<String>,
    pub follow_up_status: Option<String>,
}

impl LeadPatch {
    fn touches_assignment(&self) -> bool {
        self.assigned_to_id.is_some() || self.assigned.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub lead_id: Uuid,
    pub text: String,
    pub status: Option<String>,
}

pub(crate) fn parse_stage(stage: &str) -> AppResult<Stage> {
    stage.parse().map_err(AppError::BadRequest)
}

fn parse_follow_up_status(status: &str) -> AppResult<FollowUpStatus> {
    status.parse().map_err(AppError::BadRequest)
}

fn require_lead(db: &Database, id: Uuid) -> AppResult<Lead> {
    db.get_lead(id)?
        .ok_or_else(|| AppError::not_found("lead not found"))
}

/// Lead the viewer may see; anything else reads as missing.
fn visible_lead(db: &Database, viewer: &Actor, id: Uuid) -> AppResult<Lead> {
    let lead = require_lead(db, id)?;
    if !visibility::can_see_lead(db, viewer, &lead)? {
        return Err(AppError::not_found("lead not found"));
    }
    Ok(lead)
}

pub fn list_leads(db: &Database, actor: &Actor) -> AppResult<Vec<Lead>> {
    check(&actor.permissions, Capability::Leads, Access::Read)?;
    let leads = visibility::visible_leads(db, actor)?;
    Ok(leads.into_iter().map(normalize::normalized).collect())
}

pub fn get_lead(db: &Database, actor: &Actor, id: Uuid) -> AppResult<Lead> {
    check(&actor.permissions, Capability::Leads, Access::Read)?;
    visible_lead(db, actor, id).map(normalize::normalized)
}

pub fn create_lead(
    db: &Database,
    actor: &Actor,
    request: &NewLead,
    now: DateTime<Utc>,
) -> AppResult<Lead> {
    check(&actor.permissions, Capability::Leads, Access::Write)?;
    let name = request.name.trim();
    let email = request.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::bad_request("name and email are required"));
    }

    let assignee = assignment::resolve(
        db,
        actor,
        request.assigned_to_id,
        request.assigned.as_deref(),
    )?;

    let mut lead = Lead::new(name.to_string(), email.to_string());
    lead.phone = request.phone.clone();
    lead.company = request.company.clone();
    lead.designation = request.designation.clone();
    lead.source_type = request.source_type.clone();
    lead.source = request.source.clone();
    if let Some(status) = request.status.as_deref().filter(|s| !s.trim().is_empty()) {
        lead.status = status.trim().to_string();
    }
    lead.stage = request.stage.as_deref().map(parse_stage).transpose()?;
    lead.follow_up_required = request.follow_up_required;
    lead.follow_up_date = request.follow_up_date;
    lead.follow_up_time = request.follow_up_time.clone();
    lead.created_by = Some(actor.id());
    lead.created_at = now;
    lead.updated_at = now;
    if let Some(user) = &assignee {
        lead.assign(user.id, &user.name);
    }

    db.insert_lead(&lead)?;
    tracing::info!(lead_id = %lead.id, assigned = %lead.assigned, "created lead");
    activity::record(db, activity::lead_created(actor.id(), &lead).at(now));
    Ok(normalize::normalized(lead))
}

/// New assignee for a patch, `None` meaning unassign. Returns `Ok(None)`
/// when the patch leaves the assignment alone.
fn patched_assignee(
    db: &Database,
    actor: &Actor,
    patch: &LeadPatch,
) -> AppResult<Option<Option<User>>> {
    if let Some(target) = patch.assigned_to_id {
        return match target {
            Some(id) => assignment::resolve_by_id(db, actor, id).map(|u| Some(Some(u))),
            None => Ok(Some(None)),
        };
    }
    match patch.assigned.as_deref() {
        Some(name) => assignment::resolve_by_name(db, actor, name).map(Some),
        None => Ok(None),
    }
}

pub fn update_lead(
    db: &Database,
    actor: &Actor,
    id: Uuid,
    patch: &LeadPatch,
    now: DateTime<Utc>,
) -> AppResult<Lead> {
    check(&actor.permissions, Capability::LeadStatusUpdate, Access::Write)?;
    if patch.touches_assignment() {
        check(&actor.permissions, Capability::LeadAssignment, Access::Write)?;
    }
    let mut lead = visible_lead(db, actor, id)?;
    let old_status = lead.status.clone();
    let old_assignee = (lead.assigned_to, lead.assigned.clone());

    if let Some(assignee) = patched_assignee(db, actor, patch)? {
        match assignee {
            Some(user) => {
                lead.assign(user.id, &user.name);
                lead.created_by = Some(actor.id());
            }
            None => lead.unassign(),
        }
    }

    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name cannot be empty"));
        }
        lead.name = name.trim().to_string();
    }
    if let Some(email) = &patch.email {
        if email.trim().is_empty() {
            return Err(AppError::bad_request("email cannot be empty"));
        }
        lead.email = email.trim().to_string();
    }
    if let Some(v) = &patch.phone {
        lead.phone = Some(v.clone());
    }
    if let Some(v) = &patch.company {
        lead.company = Some(v.clone());
    }
    if let Some(v) = &patch.designation {
        lead.designation = Some(v.clone());
    }
    if let Some(v) = &patch.source_type {
        lead.source_type = Some(v.clone());
    }
    if let Some(v) = &patch.source {
        lead.source = Some(v.clone());
    }
    if let Some(status) = &patch.status {
        if status.trim().is_empty() {
            return Err(AppError::bad_request("status cannot be empty"));
        }
        lead.status = status.trim().to_string();
    }
    if let Some(stage) = &patch.stage {
        lead.stage = Some(parse_stage(stage)?);
    }
    if let Some(v) = patch.follow_up_required {
        lead.follow_up_required = v;
    }
    if let Some(v) = patch.follow_up_date {
        lead.follow_up_date = Some(v);
    }
    if let Some(v) = &patch.follow_up_time {
        lead.follow_up_time = Some(v.clone());
    }
    if let Some(v) = &patch.follow_up_status {
        lead.follow_up_status = parse_follow_up_status(v)?;
    }
    lead.updated_at = now;

    db.update_lead(&lead)?;

    if lead.status != old_status {
        activity::record(db, activity::status_changed(actor.id(), &lead, &old_status).at(now));
    }
    if (lead.assigned_to, lead.assigned.clone()) != old_assignee {
        activity::record(db, activity::lead_assigned(actor.id(), &lead).at(now));
    }
    Ok(normalize::normalized(lead))
}

pub fn delete_lead(db: &Database, actor: &Actor, id: Uuid) -> AppResult<deletion::DeletionCounts> {
    deletion::delete_lead(db, actor, id)
}

/// Anyone holding `leads` (or `all`) may comment on any lead; everyone else
/// only on leads assigned to them.
pub fn add_comment(
    db: &Database,
    actor: &Actor,
    request: &NewComment,
    now: DateTime<Utc>,
) -> AppResult<Comment> {
    let lead = require_lead(db, request.lead_id)?;
    let broad = actor.permissions.all || actor.permissions.grants(Capability::Leads);
    if !broad && !visibility::owns_lead(actor, &lead) {
        return Err(AppError::forbidden(
            "you can only add comments to leads assigned to you",
        ));
    }
    if request.text.trim().is_empty() {
        return Err(AppError::bad_request("comment text is required"));
    }

    let mut comment = Comment::new(lead.id, request.text.clone(), actor.id());
    comment.status = request.status.clone();
    comment.created_at = now;
    db.insert_comment(&comment)?;
    activity::record(db, activity::comment_added(actor.id(), &lead, comment.id).at(now));
    Ok(comment)
}

pub fn list_comments(db: &Database, actor: &Actor, lead_id: Uuid) -> AppResult<Vec<Comment>> {
    check(&actor.permissions, Capability::LeadComments, Access::Read)?;
    let lead = visible_lead(db, actor, lead_id)?;
    Ok(db.list_comments_for_lead(lead.id)?)
}

/// Can the actor write to this lead's follow-up records without the broad
/// `leads` grant?
pub(crate) fn may_touch_lead(actor: &Actor, lead: &Lead) -> bool {
    allows(&actor.permissions, Capability::Leads, Access::Write) || visibility::owns_lead(actor, lead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ActivityFilter;
    use crate::models::{ActionKind, PermissionSet, Role, ROLE_MARKETING, UNASSIGNED};
    use crate::services::testing::Fixture;

    fn new_lead(name: &str) -> NewLead {
        NewLead {
            name: name.into(),
            email: format!("{}@lead.test", name.to_lowercase()),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_lead_with_assignee() {
        let fx = Fixture::new();
        let exec = fx.executive("Eli", Some(fx.manager.id()));
        let mut req = new_lead("Acme");
        req.assigned_to_id = Some(exec.id());
        req.stage = Some("b".into());
        let lead = create_lead(&fx.db, &fx.manager, &req, Utc::now()).unwrap();
        assert_eq!(lead.assigned, "Eli");
        assert_eq!(lead.stage, Some(Stage::B));
        assert_eq!(lead.created_by, Some(fx.manager.id()));

        let mut bad = new_lead("Bad");
        bad.stage = Some("Z".into());
        assert!(matches!(
            create_lead(&fx.db, &fx.admin, &bad, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_marketing_cannot_create_leads() {
        let fx = Fixture::new();
        let marketer = fx.user("Mark", ROLE_MARKETING, None);
        let err = create_lead(&fx.db, &marketer, &new_lead("Acme"), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_get_outside_visibility_is_not_found() {
        let fx = Fixture::new();
        let eli = fx.executive("Eli", None);
        let eve = fx.executive("Eve", None);
        let lead = fx.lead_for("Acme", Some(&eve));
        let err = get_lead(&fx.db, &eli, lead.id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(get_lead(&fx.db, &eve, lead.id).unwrap().id, lead.id);
        assert_eq!(list_leads(&fx.db, &eve).unwrap().len(), 1);
        assert!(list_leads(&fx.db, &eli).unwrap().is_empty());
    }

    #[test]
    fn test_list_normalizes_source() {
        let fx = Fixture::new();
        let mut lead = Lead::new("Legacy".into(), "legacy@lead.test".into());
        lead.source_type = Some("Talk to Sales".into());
        fx.db.insert_lead(&lead).unwrap();
        let listed = list_leads(&fx.db, &fx.admin).unwrap();
        assert_eq!(listed[0].source_type.as_deref(), Some("Website"));
        assert_eq!(listed[0].source.as_deref(), Some("Talk to Sales"));
    }

    #[test]
    fn test_update_status_logs_change() {
        let fx = Fixture::new();
        let lead = fx.lead_for("Acme", None);
        let patch = LeadPatch {
            status: Some("Contacted".into()),
            ..Default::default()
        };
        let updated = update_lead(&fx.db, &fx.admin, lead.id, &patch, Utc::now()).unwrap();
        assert_eq!(updated.status, "Contacted");

        let logs = fx
            .db
            .list_activities(&ActivityFilter {
                action: Some(ActionKind::StatusChanged),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].metadata["old_status"], "New");
    }

    #[test]
    fn test_lead_writes_survive_activity_log_failure() {
        let fx = Fixture::new();
        let exec = fx.executive("Eli", None);
        fx.db.fail_inserts_into("activity_logs", "log store down").unwrap();

        let mut req = new_lead("Acme");
        req.assigned_to_id = Some(exec.id());
        let lead = create_lead(&fx.db, &fx.admin, &req, Utc::now()).unwrap();
        assert_eq!(fx.db.get_lead(lead.id).unwrap().unwrap().assigned_to, Some(exec.id()));

        let patch = LeadPatch {
            status: Some("Contacted".into()),
            assigned_to_id: Some(None),
            ..Default::default()
        };
        update_lead(&fx.db, &fx.admin, lead.id, &patch, Utc::now()).unwrap();
        let stored = fx.db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(stored.status, "Contacted");
        assert_eq!(stored.assigned, UNASSIGNED);
        assert!(fx
            .db
            .list_activities(&ActivityFilter::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_assignment_change_needs_lead_assignment() {
        let fx = Fixture::new();
        let eli = fx.executive("Eli", None);
        let eve = fx.executive("Eve", None);
        let lead = fx.lead_for("Acme", Some(&eli));

        let patch = LeadPatch {
            assigned_to_id: Some(Some(eve.id())),
            ..Default::default()
        };
        let err = update_lead(&fx.db, &eli, lead.id, &patch, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let updated = update_lead(&fx.db, &fx.admin, lead.id, &patch, Utc::now()).unwrap();
        assert_eq!(updated.assigned, "Eve");
        assert_eq!(updated.created_by, Some(fx.admin.id()));

        let unassign: LeadPatch = serde_json::from_str(r#"{"assigned_to_id": null}"#).unwrap();
        let updated = update_lead(&fx.db, &fx.admin, lead.id, &unassign, Utc::now()).unwrap();
        assert_eq!(updated.assigned, UNASSIGNED);
        assert!(updated.assigned_to.is_none());
    }

    #[test]
    fn test_executive_updates_own_lead_status() {
        let fx = Fixture::new();
        let eli = fx.executive("Eli", None);
        let lead = fx.lead_for("Acme", Some(&eli));
        let patch = LeadPatch {
            stage: Some("C".into()),
            follow_up_status: Some("Completed".into()),
            ..Default::default()
        };
        let updated = update_lead(&fx.db, &eli, lead.id, &patch, Utc::now()).unwrap();
        assert_eq!(updated.stage, Some(Stage::C));
        assert_eq!(updated.follow_up_status, FollowUpStatus::Completed);

        let bad = LeadPatch {
            follow_up_status: Some("Later".into()),
            ..Default::default()
        };
        assert!(matches!(
            update_lead(&fx.db, &eli, lead.id, &bad, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_comment_rules() {
        let fx = Fixture::new();
        let reader_role = Role::new("Reader", 4, PermissionSet::view_only());
        fx.db.insert_role(&reader_role).unwrap();
        let reader = {
            let user = User::new("Rita".into(), "rita@example.test".into(), String::new(), reader_role.id);
            fx.db.insert_user(&user).unwrap();
            Actor::from_role(user, reader_role)
        };
        let theirs = fx.lead_for("Acme", None);
        let req = NewComment {
            lead_id: theirs.id,
            text: "hello".into(),
            status: None,
        };
        let err = add_comment(&fx.db, &reader, &req, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let mut mine = Lead::new("Mine".into(), "mine@lead.test".into());
        mine.assigned = "Rita".into();
        fx.db.insert_lead(&mine).unwrap();
        let req = NewComment {
            lead_id: mine.id,
            text: "legacy name match".into(),
            status: Some("New".into()),
        };
        add_comment(&fx.db, &reader, &req, Utc::now()).unwrap();

        let exec = fx.executive("Eli", None);
        let req = NewComment {
            lead_id: theirs.id,
            text: "leads grant covers any lead".into(),
            status: None,
        };
        add_comment(&fx.db, &exec, &req, Utc::now()).unwrap();

        assert_eq!(list_comments(&fx.db, &fx.admin, theirs.id).unwrap().len(), 1);
        assert!(matches!(
            list_comments(&fx.db, &exec, theirs.id).unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn test_may_touch_lead() {
        let fx = Fixture::new();
        let marketer = fx.user("Mark", ROLE_MARKETING, None);
        let lead = fx.lead_for("Acme", Some(&marketer));
        assert!(may_touch_lead(&marketer, &lead));
        let other = fx.lead_for("Other", None);
        assert!(!may_touch_lead(&marketer, &other));
        assert!(may_touch_lead(&fx.admin, &other));
    }
}
