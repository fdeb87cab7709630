use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "Admin";
pub const ROLE_SALES_MANAGER: &str = "Sales Manager";
pub const ROLE_SALES_EXECUTIVE: &str = "Sales Executive";
pub const ROLE_MARKETING: &str = "Marketing";

/// Hierarchy level assigned to new roles when the caller does not pick one.
pub const DEFAULT_HIERARCHY_LEVEL: i64 = 3;

/// A named capability a role may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Submissions,
    Leads,
    LeadAssignment,
    LeadStatusUpdate,
    LeadComments,
    Reminders,
    Reports,
    Users,
    Roles,
    EmailTemplates,
    DeleteSubmission,
    ConvertToLead,
    Configuration,
}

impl Capability {
    pub const ALL: [Capability; 13] = [
        Self::Submissions,
        Self::Leads,
        Self::LeadAssignment,
        Self::LeadStatusUpdate,
        Self::LeadComments,
        Self::Reminders,
        Self::Reports,
        Self::Users,
        Self::Roles,
        Self::EmailTemplates,
        Self::DeleteSubmission,
        Self::ConvertToLead,
        Self::Configuration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submissions => "submissions",
            Self::Leads => "leads",
            Self::LeadAssignment => "lead_assignment",
            Self::LeadStatusUpdate => "lead_status_update",
            Self::LeadComments => "lead_comments",
            Self::Reminders => "reminders",
            Self::Reports => "reports",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::EmailTemplates => "email_templates",
            Self::DeleteSubmission => "delete_submission",
            Self::ConvertToLead => "convert_to_lead",
            Self::Configuration => "configuration",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed permission map.
///
/// On the wire and in the database this is a flat JSON object such as
/// `{"all": true, "leads": true}`. `all` and `view` are wildcard sentinels;
/// every other `true` key naming a known [`Capability`] becomes a grant.
/// Unknown keys and non-`true` values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    pub all: bool,
    pub view: bool,
    grants: BTreeSet<Capability>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything allowed.
    pub fn full() -> Self {
        Self {
            all: true,
            ..Self::default()
        }
    }

    pub fn view_only() -> Self {
        Self {
            view: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.grants.insert(capability);
        self
    }

    pub fn grant(&mut self, capability: Capability) {
        self.grants.insert(capability);
    }

    pub fn revoke(&mut self, capability: Capability) {
        self.grants.remove(&capability);
    }

    /// Explicit grant only; wildcards are not consulted.
    pub fn grants(&self, capability: Capability) -> bool {
        self.grants.contains(&capability)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = Capability> + '_ {
        self.grants.iter().copied()
    }

    pub fn from_map(map: &BTreeMap<String, serde_json::Value>) -> Self {
        let mut set = Self::default();
        for (key, value) in map {
            if value.as_bool() != Some(true) {
                continue;
            }
            match key.as_str() {
                "all" => set.all = true,
                "view" => set.view = true,
                other => {
                    if let Some(cap) = Capability::parse(other) {
                        set.grants.insert(cap);
                    }
                }
            }
        }
        set
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

impl Serialize for PermissionSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.grants.len() + usize::from(self.all) + usize::from(self.view);
        let mut map = serializer.serialize_map(Some(len))?;
        if self.all {
            map.serialize_entry("all", &true)?;
        }
        if self.view {
            map.serialize_entry("view", &true)?;
        }
        for cap in &self.grants {
            map.serialize_entry(cap.as_str(), &true)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(map.map(|m| Self::from_map(&m)).unwrap_or_default())
    }
}

/// Position in the sales organisation, derived from `hierarchy_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleTier {
    Admin,
    SalesManager,
    SalesExecutive,
    Other,
}

impl RoleTier {
    pub fn from_level(level: i64) -> Self {
        match level {
            0 => Self::Admin,
            1 => Self::SalesManager,
            2 => Self::SalesExecutive,
            _ => Self::Other,
        }
    }

    pub fn level(&self) -> Option<i64> {
        match self {
            Self::Admin => Some(0),
            Self::SalesManager => Some(1),
            Self::SalesExecutive => Some(2),
            Self::Other => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    /// 0 = Admin, 1 = Sales Manager, 2 = Sales Executive, 3+ = everything else.
    pub hierarchy_level: i64,
    pub permissions: PermissionSet,
}

impl Role {
    pub fn new(name: impl Into<String>, hierarchy_level: i64, permissions: PermissionSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            hierarchy_level,
            permissions,
        }
    }

    pub fn tier(&self) -> RoleTier {
        RoleTier::from_level(self.hierarchy_level)
    }

    /// Admin tier or holder of the `all` wildcard.
    pub fn sees_everything(&self) -> bool {
        self.tier() == RoleTier::Admin || self.permissions.all
    }
}

/// The four roles every fresh installation starts with.
pub fn default_roles() -> Vec<Role> {
    use Capability::*;

    let admin = Capability::ALL
        .iter()
        .copied()
        .filter(|c| *c != Roles && *c != Configuration && *c != ConvertToLead)
        .fold(PermissionSet::full(), PermissionSet::with);

    let manager = [
        Submissions,
        Leads,
        LeadAssignment,
        LeadStatusUpdate,
        LeadComments,
        Reminders,
        Reports,
        EmailTemplates,
        ConvertToLead,
    ]
    .into_iter()
    .fold(PermissionSet::new(), PermissionSet::with);

    let executive = [Leads, LeadStatusUpdate, LeadComments, Reminders, ConvertToLead]
        .into_iter()
        .fold(PermissionSet::new(), PermissionSet::with);

    let marketing = [Submissions, ConvertToLead, Reports, EmailTemplates]
        .into_iter()
        .fold(PermissionSet::new(), PermissionSet::with);

    vec![
        Role::new(ROLE_ADMIN, 0, admin),
        Role::new(ROLE_SALES_MANAGER, 1, manager),
        Role::new(ROLE_SALES_EXECUTIVE, 2, executive),
        Role::new(ROLE_MARKETING, 3, marketing),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_set_json_shape() {
        let perms = PermissionSet::new()
            .with(Capability::Leads)
            .with(Capability::LeadComments);
        let json = serde_json::to_value(&perms).unwrap();
        assert_eq!(json, serde_json::json!({"leads": true, "lead_comments": true}));
    }

    #[test]
    fn test_permission_set_ignores_unknown_and_false() {
        let perms = PermissionSet::from_json(
            r#"{"all": false, "view": true, "leads": true, "reports": false, "made_up": true}"#,
        )
        .unwrap();
        assert!(!perms.all);
        assert!(perms.view);
        assert!(perms.grants(Capability::Leads));
        assert!(!perms.grants(Capability::Reports));
        assert_eq!(perms.capabilities().count(), 1);
    }

    #[test]
    fn test_permission_set_null_is_empty() {
        let perms = PermissionSet::from_json("null").unwrap();
        assert_eq!(perms, PermissionSet::default());
    }

    #[test]
    fn test_capability_parse() {
        for cap in Capability::ALL {
            assert_eq!(Capability::parse(cap.as_str()), Some(cap));
        }
        assert_eq!(Capability::parse("all"), None);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(RoleTier::from_level(0), RoleTier::Admin);
        assert_eq!(RoleTier::from_level(1), RoleTier::SalesManager);
        assert_eq!(RoleTier::from_level(2), RoleTier::SalesExecutive);
        assert_eq!(RoleTier::from_level(3), RoleTier::Other);
        assert_eq!(RoleTier::from_level(9), RoleTier::Other);
    }

    #[test]
    fn test_default_roles() {
        let roles = default_roles();
        assert_eq!(roles.len(), 4);
        assert!(roles[0].permissions.all);
        assert_eq!(roles[2].name, ROLE_SALES_EXECUTIVE);
        assert_eq!(roles[2].tier(), RoleTier::SalesExecutive);
        assert!(!roles[2].permissions.grants(Capability::LeadAssignment));
        assert!(roles[1].permissions.grants(Capability::LeadAssignment));
    }
}
