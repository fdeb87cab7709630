use std::collections::HashSet;
use uuid::Uuid;

use crate::auth::Actor;
use crate::db::Database;
use crate::error::AppResult;
use crate::models::{Lead, RoleTier};

/// Ids of the Sales Executives reporting to `manager_id`.
pub fn team_ids(db: &Database, manager_id: Uuid) -> AppResult<Vec<Uuid>> {
    let level = RoleTier::SalesExecutive.level();
    Ok(db
        .list_team(manager_id, level)?
        .into_iter()
        .map(|u| u.id)
        .collect())
}

/// Assigned by id, or by the legacy display name.
pub fn owns_lead(actor: &Actor, lead: &Lead) -> bool {
    lead.assigned_to == Some(actor.id()) || lead.assigned == actor.name()
}

/// Every lead `viewer` may see, newest first.
pub fn visible_leads(db: &Database, viewer: &Actor) -> AppResult<Vec<Lead>> {
    if viewer.is_admin() {
        return Ok(db.list_leads()?);
    }
    if viewer.tier() == RoleTier::SalesManager {
        let team = team_ids(db, viewer.id())?;
        return Ok(db.list_leads_assigned_to_any(&team)?);
    }
    Ok(db.list_leads_owned_by(viewer.id(), viewer.name())?)
}

pub fn can_see_lead(db: &Database, viewer: &Actor, lead: &Lead) -> AppResult<bool> {
    if viewer.is_admin() {
        return Ok(true);
    }
    if viewer.tier() == RoleTier::SalesManager {
        let Some(assignee) = lead.assigned_to else {
            return Ok(false);
        };
        let team: HashSet<Uuid> = team_ids(db, viewer.id())?.into_iter().collect();
        return Ok(team.contains(&assignee));
    }
    Ok(owns_lead(viewer, lead))
}
