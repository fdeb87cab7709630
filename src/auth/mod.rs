//! Credentials, tokens and the permission model.

pub mod hierarchy;
pub mod password;
pub mod permissions;
pub mod token;

pub use hierarchy::can_manage_role;
pub use permissions::{allows, check, Access};
pub use token::Claims;

use uuid::Uuid;

use crate::models::{PermissionSet, Role, RoleTier, User};

/// The authenticated caller: the stored user, their role, and the
/// permission snapshot from the token they presented.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user: User,
    pub role: Role,
    pub permissions: PermissionSet,
}

impl Actor {
    /// Actor whose permissions are the role's current permissions.
    pub fn from_role(user: User, role: Role) -> Self {
        let permissions = role.permissions.clone();
        Self {
            user,
            role,
            permissions,
        }
    }

    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn name(&self) -> &str {
        &self.user.name
    }

    pub fn tier(&self) -> RoleTier {
        self.role.tier()
    }

    pub fn level(&self) -> i64 {
        self.role.hierarchy_level
    }

    /// Admin tier or `all` in the permission snapshot.
    pub fn is_admin(&self) -> bool {
        self.tier() == RoleTier::Admin || self.permissions.all
    }

    /// Admin or Sales Manager tier.
    pub fn is_supervisor(&self) -> bool {
        matches!(self.tier(), RoleTier::Admin | RoleTier::SalesManager) || self.permissions.all
    }
}
