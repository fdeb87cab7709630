//! Shared fixtures for service tests.

use uuid::Uuid;

use crate::auth::password::hash_password;
use crate::auth::Actor;
use crate::db::Database;
use crate::models::*;

pub struct Fixture {
    pub db: Database,
    pub roles: Vec<Role>,
    pub admin: Actor,
    pub manager: Actor,
}

impl Fixture {
    pub fn new() -> Self {
        let db = Database::open_memory().unwrap();
        let roles = default_roles();
        for role in &roles {
            db.insert_role(role).unwrap();
        }
        let mut fx = Self {
            admin: placeholder(),
            manager: placeholder(),
            db,
            roles,
        };
        fx.admin = fx.user("Ada Admin", ROLE_ADMIN, None);
        fx.manager = fx.user("Max Manager", ROLE_SALES_MANAGER, None);
        fx
    }

    pub fn role(&self, name: &str) -> &Role {
        self.roles.iter().find(|r| r.name == name).unwrap()
    }

    pub fn user(&self, name: &str, role_name: &str, manager_id: Option<Uuid>) -> Actor {
        let role = self.role(role_name).clone();
        let email = format!("{}@example.test", name.to_lowercase().replace(' ', "."));
        let mut user = User::new(name.into(), email, hash_password("secret1"), role.id);
        user.manager_id = manager_id;
        self.db.insert_user(&user).unwrap();
        Actor::from_role(user, role)
    }

    pub fn executive(&self, name: &str, manager_id: Option<Uuid>) -> Actor {
        self.user(name, ROLE_SALES_EXECUTIVE, manager_id)
    }

    pub fn lead_for(&self, name: &str, owner: Option<&Actor>) -> Lead {
        let mut lead = Lead::new(name.into(), format!("{}@lead.test", name.to_lowercase()));
        if let Some(owner) = owner {
            lead.assign(owner.id(), owner.name());
        }
        self.db.insert_lead(&lead).unwrap();
        lead
    }
}

fn placeholder() -> Actor {
    let role = Role::new("placeholder", 9, PermissionSet::new());
    let user = User::new(String::new(), String::new(), String::new(), role.id);
    Actor::from_role(user, role)
}
