//! User and role administration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::activity;
use crate::auth::password::{hash_password, MIN_PASSWORD_LEN};
use crate::auth::{can_manage_role, check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    ActionKind, Capability, PermissionSet, Role, RoleTier, User, UserProfile,
    DEFAULT_HIERARCHY_LEVEL, ROLE_MARKETING,
};

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    /// Role name.
    pub role: Option<String>,
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_id: Uuid,
    #[serde(default)]
    pub manager_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub manager_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerNode {
    #[serde(flatten)]
    pub manager: UserProfile,
    pub team: Vec<UserProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hierarchy {
    pub managers: Vec<ManagerNode>,
    pub admin_users: Vec<UserProfile>,
    pub marketing_users: Vec<UserProfile>,
    pub unassigned_executives: Vec<UserProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub hierarchy_level: Option<i64>,
    #[serde(default)]
    pub permissions: PermissionSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolePatch {
    pub name: Option<String>,
    pub hierarchy_level: Option<i64>,
    pub permissions: Option<PermissionSet>,
}

fn require_role(db: &Database, id: Uuid) -> AppResult<Role> {
    db.get_role(id)?
        .ok_or_else(|| AppError::not_found("role not found"))
}

fn require_profile(db: &Database, id: Uuid) -> AppResult<UserProfile> {
    db.get_user_profile(id)?
        .ok_or_else(|| AppError::not_found("user not found"))
}

/// Admin sees everyone, a Sales Manager sees their own team, anyone else
/// needs `users` read access.
pub fn list_users(db: &Database, actor: &Actor, query: &UserQuery) -> AppResult<Vec<UserProfile>> {
    let mut manager_id = query.manager_id;
    if !actor.is_admin() {
        if actor.tier() == RoleTier::SalesManager {
            match manager_id {
                Some(id) if id != actor.id() => {
                    return Err(AppError::forbidden(
                        "Sales Managers can only view their own team",
                    ))
                }
                _ => manager_id = Some(actor.id()),
            }
        } else {
            check(&actor.permissions, Capability::Users, Access::Read)?;
        }
    }

    let role_id = match query.role.as_deref() {
        Some(name) => match db.get_role_by_name(name)? {
            Some(role) => Some(role.id),
            None => return Ok(Vec::new()),
        },
        None => None,
    };
    Ok(db.list_user_profiles(role_id, manager_id)?)
}

/// Sales Executives the actor may hand leads to.
pub fn assignable_users(db: &Database, actor: &Actor) -> AppResult<Vec<UserProfile>> {
    let Some(level) = RoleTier::SalesExecutive.level() else {
        return Ok(Vec::new());
    };
    let executives = if actor.tier() == RoleTier::SalesManager && !actor.permissions.all {
        db.list_team(actor.id(), Some(level))?
    } else if actor.is_admin() {
        db.list_users_at_level(level)?
    } else {
        check(&actor.permissions, Capability::LeadAssignment, Access::Read)?;
        db.list_users_at_level(level)?
    };
    let mut profiles = Vec::with_capacity(executives.len());
    for user in executives {
        if let Some(profile) = db.get_user_profile(user.id)? {
            profiles.push(profile);
        }
    }
    Ok(profiles)
}

pub fn hierarchy(db: &Database, actor: &Actor) -> AppResult<Hierarchy> {
    check(&actor.permissions, Capability::Users, Access::Read)?;

    let roles = db.list_roles()?;
    let tier_of = |role_id: Uuid| {
        roles
            .iter()
            .find(|r| r.id == role_id)
            .map(|r| r.tier())
            .unwrap_or(RoleTier::Other)
    };
    let is_marketing = |role_id: Uuid| {
        roles
            .iter()
            .any(|r| r.id == role_id && r.name == ROLE_MARKETING)
    };

    let profiles = db.list_user_profiles(None, None)?;
    let mut managers = Vec::new();
    let mut admin_users = Vec::new();
    let mut marketing_users = Vec::new();
    let mut executives = Vec::new();
    for profile in profiles {
        match tier_of(profile.role_id) {
            RoleTier::Admin => admin_users.push(profile),
            RoleTier::SalesManager => managers.push(ManagerNode {
                manager: profile,
                team: Vec::new(),
            }),
            RoleTier::SalesExecutive => executives.push(profile),
            RoleTier::Other if is_marketing(profile.role_id) => marketing_users.push(profile),
            RoleTier::Other => {}
        }
    }

    let mut unassigned_executives = Vec::new();
    for exec in executives {
        let node = exec
            .manager_id
            .and_then(|id| managers.iter_mut().find(|m| m.manager.id == id));
        match node {
            Some(node) => node.team.push(exec),
            None => unassigned_executives.push(exec),
        }
    }

    Ok(Hierarchy {
        managers,
        admin_users,
        marketing_users,
        unassigned_executives,
    })
}

/// A manager must be an existing Sales Manager tier user other than the
/// user being edited.
fn check_manager(db: &Database, user_id: Uuid, manager_id: Uuid) -> AppResult<()> {
    if manager_id == user_id {
        return Err(AppError::bad_request("a user cannot be their own manager"));
    }
    let manager = db
        .get_user(manager_id)?
        .ok_or_else(|| AppError::bad_request("manager not found"))?;
    let tier = db
        .get_role(manager.role_id)?
        .map(|r| r.tier())
        .unwrap_or(RoleTier::Other);
    if tier != RoleTier::SalesManager {
        return Err(AppError::bad_request("manager must be a Sales Manager"));
    }
    Ok(())
}

fn check_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn check_email_free(db: &Database, email: &str, except: Option<Uuid>) -> AppResult<()> {
    if let Some(existing) = db.get_user_by_email(email)? {
        if Some(existing.id) != except {
            return Err(AppError::bad_request("email already registered"));
        }
    }
    Ok(())
}

pub fn create_user(
    db: &Database,
    actor: &Actor,
    request: &NewUser,
    now: DateTime<Utc>,
) -> AppResult<UserProfile> {
    check(&actor.permissions, Capability::Users, Access::Write)?;
    let role = require_role(db, request.role_id)?;
    if !can_manage_role(actor.level(), role.hierarchy_level) {
        return Err(AppError::forbidden(format!(
            "you cannot create users with role {}",
            role.name
        )));
    }

    let name = request.name.trim();
    let email = request.email.trim();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::bad_request("name and email are required"));
    }
    check_password(&request.password)?;
    check_email_free(db, email, None)?;

    let mut user = User::new(
        name.to_string(),
        email.to_string(),
        hash_password(&request.password),
        role.id,
    );
    user.created_at = now;
    user.manager_id = if actor.tier() == RoleTier::SalesManager
        && role.tier() == RoleTier::SalesExecutive
    {
        Some(actor.id())
    } else if role.name == ROLE_MARKETING {
        None
    } else {
        request.manager_id
    };
    if let Some(manager_id) = user.manager_id {
        check_manager(db, user.id, manager_id)?;
    }

    db.insert_user(&user)?;
    tracing::info!(user_id = %user.id, role = %role.name, "created user");
    activity::record(db, activity::user_action(actor.id(), ActionKind::UserCreated, &user).at(now));
    require_profile(db, user.id)
}

pub fn update_user(
    db: &Database,
    actor: &Actor,
    user_id: Uuid,
    patch: &UserPatch,
    now: DateTime<Utc>,
) -> AppResult<UserProfile> {
    check(&actor.permissions, Capability::Users, Access::Write)?;
    let mut user = db
        .get_user(user_id)?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    if let Some(role_id) = patch.role_id {
        if role_id != user.role_id {
            let role = require_role(db, role_id)?;
            if !can_manage_role(actor.level(), role.hierarchy_level) {
                return Err(AppError::forbidden(format!(
                    "you cannot assign role {}",
                    role.name
                )));
            }
            user.role_id = role.id;
        }
    }
    if let Some(name) = &patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("name cannot be empty"));
        }
        user.name = name.to_string();
    }
    if let Some(email) = &patch.email {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::bad_request("email cannot be empty"));
        }
        check_email_free(db, email, Some(user.id))?;
        user.email = email.to_string();
    }
    if let Some(password) = &patch.password {
        check_password(password)?;
        user.password_hash = hash_password(password);
    }
    if let Some(manager_id) = patch.manager_id {
        if let Some(id) = manager_id {
            check_manager(db, user.id, id)?;
        }
        user.manager_id = manager_id;
    }

    db.update_user(&user)?;
    activity::record(db, activity::user_action(actor.id(), ActionKind::UserUpdated, &user).at(now));
    require_profile(db, user.id)
}

/// Removes the user, unassigning their leads and detaching their reports in
/// the same transaction.
pub fn delete_user(db: &Database, actor: &Actor, user_id: Uuid, now: DateTime<Utc>) -> AppResult<()> {
    check(&actor.permissions, Capability::Users, Access::Write)?;
    if user_id == actor.id() {
        return Err(AppError::bad_request("you cannot delete your own account"));
    }
    let user = db
        .get_user(user_id)?
        .ok_or_else(|| AppError::not_found("user not found"))?;

    let (leads, reports) = db.with_transaction(|tx| -> AppResult<(usize, usize)> {
        let leads = tx.unassign_leads_of(user.id, &user.name)?;
        let reports = tx.clear_manager(user.id)?;
        tx.delete_user(user.id)?;
        tx.insert_activity(&activity::user_action(actor.id(), ActionKind::UserDeleted, &user).at(now))?;
        Ok((leads, reports))
    })?;

    tracing::info!(
        user_id = %user.id,
        leads_unassigned = leads,
        reports_detached = reports,
        "deleted user"
    );
    Ok(())
}

pub fn list_roles(db: &Database, actor: &Actor) -> AppResult<Vec<Role>> {
    check(&actor.permissions, Capability::Roles, Access::Read)?;
    Ok(db.list_roles()?)
}

fn check_role_name_free(db: &Database, name: &str, except: Option<Uuid>) -> AppResult<()> {
    if let Some(existing) = db.get_role_by_name(name)? {
        if Some(existing.id) != except {
            return Err(AppError::bad_request(format!("role {} already exists", name)));
        }
    }
    Ok(())
}

fn check_manages(actor: &Actor, level: i64) -> AppResult<()> {
    if can_manage_role(actor.level(), level) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "you cannot manage roles at or above your own level",
        ))
    }
}

pub fn create_role(db: &Database, actor: &Actor, request: &NewRole) -> AppResult<Role> {
    check(&actor.permissions, Capability::Roles, Access::Write)?;
    let level = request.hierarchy_level.unwrap_or(DEFAULT_HIERARCHY_LEVEL);
    check_manages(actor, level)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("role name is required"));
    }
    check_role_name_free(db, name, None)?;

    let role = Role::new(name, level, request.permissions.clone());
    db.insert_role(&role)?;
    tracing::info!(role_id = %role.id, name = %role.name, level, "created role");
    Ok(role)
}

pub fn update_role(db: &Database, actor: &Actor, role_id: Uuid, patch: &RolePatch) -> AppResult<Role> {
    check(&actor.permissions, Capability::Roles, Access::Write)?;
    let mut role = require_role(db, role_id)?;
    check_manages(actor, role.hierarchy_level)?;

    if let Some(level) = patch.hierarchy_level {
        check_manages(actor, level)?;
        role.hierarchy_level = level;
    }
    if let Some(name) = &patch.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request("role name cannot be empty"));
        }
        check_role_name_free(db, name, Some(role.id))?;
        role.name = name.to_string();
    }
    if let Some(perms) = &patch.permissions {
        role.permissions = perms.clone();
    }

    db.update_role(&role)?;
    Ok(role)
}

pub fn delete_role(db: &Database, actor: &Actor, role_id: Uuid) -> AppResult<()> {
    check(&actor.permissions, Capability::Roles, Access::Write)?;
    let role = require_role(db, role_id)?;
    check_manages(actor, role.hierarchy_level)?;
    let in_use = db.count_users_with_role(role.id)?;
    if in_use > 0 {
        return Err(AppError::bad_request(format!(
            "role {} is still assigned to {} user(s)",
            role.name, in_use
        )));
    }
    db.delete_role(role.id)?;
    tracing::info!(role_id = %role.id, name = %role.name, "deleted role");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ROLE_ADMIN, ROLE_SALES_EXECUTIVE, ROLE_SALES_MANAGER};
    use crate::services::testing::Fixture;

    fn new_user(fx: &Fixture, name: &str, role: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: format!("{}@new.test", name.to_lowercase()),
            password: "longenough".into(),
            role_id: fx.role(role).id,
            manager_id: None,
        }
    }

    #[test]
    fn test_manager_lists_only_own_team() {
        let fx = Fixture::new();
        fx.executive("Mine", Some(fx.manager.id()));
        fx.executive("Loose", None);

        let team = list_users(&fx.db, &fx.manager, &UserQuery::default()).unwrap();
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].name, "Mine");
        assert_eq!(team[0].manager_name.as_deref(), Some("Max Manager"));

        let other = UserQuery {
            manager_id: Some(fx.admin.id()),
            ..Default::default()
        };
        let err = list_users(&fx.db, &fx.manager, &other).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_list_users_by_role_name() {
        let fx = Fixture::new();
        fx.executive("Eli", None);
        let query = UserQuery {
            role: Some(ROLE_SALES_EXECUTIVE.into()),
            ..Default::default()
        };
        let execs = list_users(&fx.db, &fx.admin, &query).unwrap();
        assert_eq!(execs.len(), 1);
        assert_eq!(execs[0].role_name.as_deref(), Some(ROLE_SALES_EXECUTIVE));

        let exec = fx.executive("Eve", None);
        let err = list_users(&fx.db, &exec, &UserQuery::default()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_assignable_users() {
        let fx = Fixture::new();
        fx.executive("Mine", Some(fx.manager.id()));
        fx.executive("Loose", None);
        assert_eq!(assignable_users(&fx.db, &fx.admin).unwrap().len(), 2);
        let mine = assignable_users(&fx.db, &fx.manager).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "Mine");
    }

    #[test]
    fn test_manager_creating_executive_becomes_their_manager() {
        let fx = Fixture::new();
        let req = new_user(&fx, "Newbie", ROLE_SALES_EXECUTIVE);
        let err = create_user(&fx.db, &fx.manager, &req, Utc::now()).unwrap_err();
        // default Sales Manager role lacks `users`
        assert!(matches!(err, AppError::Forbidden(_)));

        let mut role = fx.role(ROLE_SALES_MANAGER).clone();
        role.permissions.grant(Capability::Users);
        let manager = Actor::from_role(fx.manager.user.clone(), role);
        let profile = create_user(&fx.db, &manager, &req, Utc::now()).unwrap();
        assert_eq!(profile.manager_id, Some(manager.id()));
    }

    #[test]
    fn test_hierarchy_guards_user_creation() {
        let fx = Fixture::new();
        let mut role = fx.role(ROLE_SALES_MANAGER).clone();
        role.permissions.grant(Capability::Users);
        let manager = Actor::from_role(fx.manager.user.clone(), role);
        let req = new_user(&fx, "Boss", ROLE_ADMIN);
        let err = create_user(&fx.db, &manager, &req, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_create_user_validation() {
        let fx = Fixture::new();
        let mut req = new_user(&fx, "Short", ROLE_SALES_EXECUTIVE);
        req.password = "abc".into();
        assert!(matches!(
            create_user(&fx.db, &fx.admin, &req, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));

        let mut req = new_user(&fx, "Dup", ROLE_SALES_EXECUTIVE);
        req.email = fx.admin.user.email.to_uppercase();
        assert!(matches!(
            create_user(&fx.db, &fx.admin, &req, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));

        let mut req = new_user(&fx, "Badmgr", ROLE_SALES_EXECUTIVE);
        req.manager_id = Some(fx.admin.id());
        assert!(matches!(
            create_user(&fx.db, &fx.admin, &req, Utc::now()).unwrap_err(),
            AppError::BadRequest(_)
        ));

        let mut req = new_user(&fx, "Marketer", ROLE_MARKETING);
        req.manager_id = Some(fx.manager.id());
        let profile = create_user(&fx.db, &fx.admin, &req, Utc::now()).unwrap();
        assert_eq!(profile.manager_id, None);
    }

    #[test]
    fn test_update_user_role_and_password() {
        let fx = Fixture::new();
        let exec = fx.executive("Eli", None);
        let patch = UserPatch {
            role_id: Some(fx.role(ROLE_SALES_MANAGER).id),
            password: Some("newsecret".into()),
            ..Default::default()
        };
        let profile = update_user(&fx.db, &fx.admin, exec.id(), &patch, Utc::now()).unwrap();
        assert_eq!(profile.role_name.as_deref(), Some(ROLE_SALES_MANAGER));
        let stored = fx.db.get_user(exec.id()).unwrap().unwrap();
        assert!(crate::auth::password::verify_password("newsecret", &stored.password_hash));

        let err = update_user(&fx.db, &fx.admin, Uuid::new_v4(), &patch, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_patch_distinguishes_null_manager() {
        let patch: UserPatch = serde_json::from_str(r#"{"manager_id": null}"#).unwrap();
        assert_eq!(patch.manager_id, Some(None));
        let patch: UserPatch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.manager_id, None);
    }

    #[test]
    fn test_self_manager_rejected() {
        let fx = Fixture::new();
        let patch = UserPatch {
            manager_id: Some(Some(fx.manager.id())),
            ..Default::default()
        };
        let err = update_user(&fx.db, &fx.admin, fx.manager.id(), &patch, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_delete_user_unassigns_leads_and_reports() {
        let fx = Fixture::new();
        let mgr = fx.user("Olga", ROLE_SALES_MANAGER, None);
        let exec = fx.executive("Eli", Some(mgr.id()));
        let lead = fx.lead_for("Acme", Some(&mgr));

        delete_user(&fx.db, &fx.admin, mgr.id(), Utc::now()).unwrap();
        assert!(fx.db.get_user(mgr.id()).unwrap().is_none());
        let lead = fx.db.get_lead(lead.id).unwrap().unwrap();
        assert_eq!(lead.assigned_to, None);
        assert_eq!(lead.assigned, crate::models::UNASSIGNED);
        assert_eq!(fx.db.get_user(exec.id()).unwrap().unwrap().manager_id, None);

        let err = delete_user(&fx.db, &fx.admin, fx.admin.id(), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_delete_user_keeps_namesake_leads() {
        let fx = Fixture::new();
        let first = fx.executive("Eli", None);
        let role = fx.role(ROLE_SALES_EXECUTIVE).clone();
        let user = User::new(
            "Eli".into(),
            "eli.two@example.test".into(),
            hash_password("secret1"),
            role.id,
        );
        fx.db.insert_user(&user).unwrap();
        let second = Actor::from_role(user, role);
        let theirs = fx.lead_for("Acme", Some(&second));
        let mine = fx.lead_for("Globex", Some(&first));

        delete_user(&fx.db, &fx.admin, first.id(), Utc::now()).unwrap();
        let theirs = fx.db.get_lead(theirs.id).unwrap().unwrap();
        assert_eq!(theirs.assigned_to, Some(second.id()));
        assert_eq!(theirs.assigned, "Eli");
        let mine = fx.db.get_lead(mine.id).unwrap().unwrap();
        assert_eq!(mine.assigned_to, None);
        assert_eq!(mine.assigned, crate::models::UNASSIGNED);
    }

    #[test]
    fn test_hierarchy_view() {
        let fx = Fixture::new();
        fx.executive("Mine", Some(fx.manager.id()));
        fx.executive("Loose", None);
        fx.user("Mark", ROLE_MARKETING, None);

        let view = hierarchy(&fx.db, &fx.admin).unwrap();
        assert_eq!(view.managers.len(), 1);
        assert_eq!(view.managers[0].team.len(), 1);
        assert_eq!(view.admin_users.len(), 1);
        assert_eq!(view.marketing_users.len(), 1);
        assert_eq!(view.unassigned_executives.len(), 1);
    }

    #[test]
    fn test_role_lifecycle() {
        let fx = Fixture::new();
        let mut perms = fx.admin.permissions.clone();
        perms.grant(Capability::Roles);
        let admin = Actor {
            permissions: perms,
            ..fx.admin.clone()
        };

        let role = create_role(
            &fx.db,
            &admin,
            &NewRole {
                name: "Intern".into(),
                hierarchy_level: None,
                permissions: PermissionSet::view_only(),
            },
        )
        .unwrap();
        assert_eq!(role.hierarchy_level, DEFAULT_HIERARCHY_LEVEL);

        let dup = NewRole {
            name: "Intern".into(),
            hierarchy_level: Some(4),
            permissions: PermissionSet::new(),
        };
        assert!(matches!(
            create_role(&fx.db, &admin, &dup).unwrap_err(),
            AppError::BadRequest(_)
        ));

        let patch = RolePatch {
            name: Some("Trainee".into()),
            ..Default::default()
        };
        assert_eq!(update_role(&fx.db, &admin, role.id, &patch).unwrap().name, "Trainee");

        let in_use = fx.role(ROLE_SALES_EXECUTIVE).id;
        fx.executive("Eli", None);
        assert!(matches!(
            delete_role(&fx.db, &admin, in_use).unwrap_err(),
            AppError::BadRequest(_)
        ));
        delete_role(&fx.db, &admin, role.id).unwrap();
        assert!(fx.db.get_role(role.id).unwrap().is_none());
    }

    #[test]
    fn test_manager_cannot_edit_higher_roles() {
        let fx = Fixture::new();
        let mut role = fx.role(ROLE_SALES_MANAGER).clone();
        role.permissions.grant(Capability::Roles);
        let manager = Actor::from_role(fx.manager.user.clone(), role);
        let admin_role = fx.role(ROLE_ADMIN).id;
        let err = update_role(&fx.db, &manager, admin_role, &RolePatch::default()).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
