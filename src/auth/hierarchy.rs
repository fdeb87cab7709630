use crate::models::RoleTier;

/// Admins manage every role, Sales Managers manage the levels below them,
/// nobody else manages roles.
pub fn can_manage_role(actor_level: i64, target_level: i64) -> bool {
    match RoleTier::from_level(actor_level) {
        RoleTier::Admin => true,
        RoleTier::SalesManager => target_level >= 2,
        _ => false,
    }
}
