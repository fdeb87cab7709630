use crate::error::{AppError, AppResult};
use crate::models::{Capability, PermissionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Capabilities a `view` grant opens for reading.
const VIEW_READABLE: [Capability; 3] = [
    Capability::Leads,
    Capability::Submissions,
    Capability::Reports,
];

/// Capabilities readable by anyone holding `leads`.
const INHERITED_FROM_LEADS: [Capability; 3] = [
    Capability::LeadStatusUpdate,
    Capability::LeadComments,
    Capability::LeadAssignment,
];

/// Does `perms` allow `access` to `capability`?
pub fn allows(perms: &PermissionSet, capability: Capability, access: Access) -> bool {
    if perms.all {
        return true;
    }
    if perms.grants(capability) {
        return true;
    }
    match access {
        Access::Write => false,
        Access::Read => {
            (perms.view && VIEW_READABLE.contains(&capability))
                || (INHERITED_FROM_LEADS.contains(&capability)
                    && perms.grants(Capability::Leads))
        }
    }
}

pub fn check(perms: &PermissionSet, capability: Capability, access: Access) -> AppResult<()> {
    if allows(perms, capability, access) {
        return Ok(());
    }
    Err(match access {
        Access::Write => {
            AppError::forbidden(format!("write access required for: {}", capability))
        }
        Access::Read => AppError::forbidden(format!("permission required: {}", capability)),
    })
}
