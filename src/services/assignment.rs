//! Who may receive a lead, and from whom.

use uuid::Uuid;

use crate::auth::Actor;
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{RoleTier, User, UNASSIGNED};

/// Only Sales Executives receive leads, and a Sales Manager may only hand
/// leads to their own reports.
pub fn check_eligible(db: &Database, actor: &Actor, assignee: &User) -> AppResult<()> {
    let tier = db
        .get_role(assignee.role_id)?
        .map(|r| r.tier())
        .unwrap_or(RoleTier::Other);
    if tier != RoleTier::SalesExecutive {
        return Err(AppError::bad_request(
            "can only assign leads to Sales Executives",
        ));
    }
    if actor.tier() == RoleTier::SalesManager && assignee.manager_id != Some(actor.id()) {
        return Err(AppError::forbidden(
            "you can only assign leads to your own Sales Executives",
        ));
    }
    Ok(())
}

pub fn resolve_by_id(db: &Database, actor: &Actor, user_id: Uuid) -> AppResult<User> {
    let user = db
        .get_user(user_id)?
        .ok_or_else(|| AppError::not_found("assigned user not found"))?;
    check_eligible(db, actor, &user)?;
    Ok(user)
}

/// Legacy name lookup. Blank, "Unassigned" or an unknown name yields `None`.
pub fn resolve_by_name(db: &Database, actor: &Actor, name: &str) -> AppResult<Option<User>> {
    let name = name.trim();
    if name.is_empty() || name == UNASSIGNED {
        return Ok(None);
    }
    let Some(user) = db.find_user_by_name(name)? else {
        return Ok(None);
    };
    check_eligible(db, actor, &user)?;
    Ok(Some(user))
}

/// Explicit id wins over the name.
pub fn resolve(
    db: &Database,
    actor: &Actor,
    user_id: Option<Uuid>,
    name: Option<&str>,
) -> AppResult<Option<User>> {
    match (user_id, name) {
        (Some(id), _) => resolve_by_id(db, actor, id).map(Some),
        (None, Some(name)) => resolve_by_name(db, actor, name),
        (None, None) => Ok(None),
    }
}
