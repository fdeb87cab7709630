//! Login, token verification, self-service password changes and first-run
//! seeding.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::activity;
use crate::auth::password::{hash_password, verify_password, MIN_PASSWORD_LEN};
use crate::auth::token::{self, TokenError};
use crate::auth::{Actor, Claims};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{default_roles, PermissionSet, User, ROLE_ADMIN};

pub const TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role_id: Uuid,
    pub role_name: String,
    pub permissions: PermissionSet,
}

impl SessionUser {
    fn of(actor: &Actor) -> Self {
        Self {
            id: actor.user.id,
            name: actor.user.name.clone(),
            email: actor.user.email.clone(),
            role_id: actor.role.id,
            role_name: actor.role.name.clone(),
            permissions: actor.permissions.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePassword {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub roles_created: Vec<String>,
    pub admin_created: bool,
    pub admin_id: Option<Uuid>,
}

fn bad_credentials() -> AppError {
    AppError::unauthorized("incorrect email or password")
}

pub fn login(
    db: &Database,
    request: &LoginRequest,
    secret: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> AppResult<LoginResponse> {
    let user = db
        .get_user_by_email(request.email.trim())?
        .ok_or_else(bad_credentials)?;
    if !verify_password(&request.password, &user.password_hash) {
        tracing::info!(user_id = %user.id, "rejected login");
        return Err(bad_credentials());
    }
    let role = db
        .get_role(user.role_id)?
        .ok_or_else(|| AppError::unauthorized("user has no role"))?;

    let claims = Claims::new(&user, &role, now, ttl);
    let access_token = token::encode(&claims, secret).map_err(|e| anyhow::anyhow!(e))?;
    activity::record(db, activity::login(&user).at(now));

    let actor = Actor::from_role(user, role);
    Ok(LoginResponse {
        access_token,
        token_type: TOKEN_TYPE,
        user: SessionUser::of(&actor),
    })
}

/// Resolve a bearer token into the acting user. Permissions come from the
/// token, not the role's current row.
pub fn authenticate(db: &Database, bearer: &str, secret: &str, now: DateTime<Utc>) -> AppResult<Actor> {
    let claims = token::decode(bearer, secret, now).map_err(|e| match e {
        TokenError::Expired => AppError::unauthorized("token expired"),
        _ => AppError::unauthorized("could not validate credentials"),
    })?;
    let user = db
        .get_user(claims.user_id)?
        .ok_or_else(|| AppError::unauthorized("could not validate credentials"))?;
    let role = db
        .get_role(user.role_id)?
        .ok_or_else(|| AppError::unauthorized("could not validate credentials"))?;
    Ok(Actor {
        user,
        role,
        permissions: claims.permissions,
    })
}

pub fn me(actor: &Actor) -> SessionUser {
    SessionUser::of(actor)
}

pub fn change_password(db: &Database, actor: &Actor, request: &ChangePassword) -> AppResult<()> {
    if !verify_password(&request.old_password, &actor.user.password_hash) {
        return Err(AppError::unauthorized("current password is incorrect"));
    }
    if request.new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "new password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    db.update_password(actor.id(), &hash_password(&request.new_password))?;
    tracing::info!(user_id = %actor.id(), "password changed");
    Ok(())
}

/// Create any missing default role and, unless the email is taken, an Admin
/// user. Safe to run repeatedly.
pub fn seed(
    db: &Database,
    admin_name: &str,
    admin_email: &str,
    admin_password: &str,
    now: DateTime<Utc>,
) -> AppResult<SeedReport> {
    if admin_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "admin password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    db.with_transaction(|tx| -> AppResult<SeedReport> {
        let mut report = SeedReport::default();
        for role in default_roles() {
            if tx.get_role_by_name(&role.name)?.is_none() {
                tx.insert_role(&role)?;
                report.roles_created.push(role.name.clone());
            }
        }

        if tx.get_user_by_email(admin_email)?.is_none() {
            let admin_role = tx
                .get_role_by_name(ROLE_ADMIN)?
                .ok_or_else(|| AppError::not_found("admin role not found"))?;
            let mut user = User::new(
                admin_name.to_string(),
                admin_email.to_string(),
                hash_password(admin_password),
                admin_role.id,
            );
            user.created_at = now;
            tx.insert_user(&user)?;
            report.admin_created = true;
            report.admin_id = Some(user.id);
        }
        Ok(report)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionKind, ROLE_SALES_EXECUTIVE};
    use crate::services::testing::Fixture;

    const SECRET: &str = "test-secret";

    fn login_as(fx: &Fixture, email: &str, password: &str) -> AppResult<LoginResponse> {
        let req = LoginRequest {
            email: email.into(),
            password: password.into(),
        };
        login(&fx.db, &req, SECRET, Duration::hours(24), Utc::now())
    }

    #[test]
    fn test_login_issues_token_and_logs() {
        let fx = Fixture::new();
        let resp = login_as(&fx, &fx.admin.user.email, "secret1").unwrap();
        assert_eq!(resp.token_type, "bearer");
        assert_eq!(resp.user.role_name, ROLE_ADMIN);
        assert!(resp.user.permissions.all);

        let actor = authenticate(&fx.db, &resp.access_token, SECRET, Utc::now()).unwrap();
        assert_eq!(actor.id(), fx.admin.id());

        let logins = fx
            .db
            .list_activities(&crate::db::ActivityFilter {
                action: Some(ActionKind::Login),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(logins.len(), 1);
    }

    #[test]
    fn test_bad_credentials() {
        let fx = Fixture::new();
        assert!(matches!(
            login_as(&fx, &fx.admin.user.email, "wrong").unwrap_err(),
            AppError::Unauthorized(_)
        ));
        assert!(matches!(
            login_as(&fx, "nobody@example.test", "secret1").unwrap_err(),
            AppError::Unauthorized(_)
        ));
    }

    #[test]
    fn test_authenticate_rejects_bad_tokens() {
        let fx = Fixture::new();
        let resp = login_as(&fx, &fx.admin.user.email, "secret1").unwrap();
        let later = Utc::now() + Duration::hours(25);
        assert!(matches!(
            authenticate(&fx.db, &resp.access_token, SECRET, later).unwrap_err(),
            AppError::Unauthorized(_)
        ));
        assert!(authenticate(&fx.db, &resp.access_token, "other", Utc::now()).is_err());
        assert!(authenticate(&fx.db, "garbage", SECRET, Utc::now()).is_err());

        fx.db.delete_user(fx.admin.id()).unwrap();
        assert!(authenticate(&fx.db, &resp.access_token, SECRET, Utc::now()).is_err());
    }

    #[test]
    fn test_permissions_come_from_token_snapshot() {
        let fx = Fixture::new();
        let exec = fx.executive("Eli", None);
        let resp = login_as(&fx, &exec.user.email, "secret1").unwrap();

        let mut role = fx.role(ROLE_SALES_EXECUTIVE).clone();
        role.permissions = PermissionSet::full();
        fx.db.update_role(&role).unwrap();

        let actor = authenticate(&fx.db, &resp.access_token, SECRET, Utc::now()).unwrap();
        assert!(!actor.permissions.all);
    }

    #[test]
    fn test_change_password() {
        let fx = Fixture::new();
        let short = ChangePassword {
            old_password: "secret1".into(),
            new_password: "abc".into(),
        };
        assert!(matches!(
            change_password(&fx.db, &fx.admin, &short).unwrap_err(),
            AppError::BadRequest(_)
        ));
        let wrong = ChangePassword {
            old_password: "nope".into(),
            new_password: "abcdef".into(),
        };
        assert!(matches!(
            change_password(&fx.db, &fx.admin, &wrong).unwrap_err(),
            AppError::Unauthorized(_)
        ));
        let ok = ChangePassword {
            old_password: "secret1".into(),
            new_password: "abcdef".into(),
        };
        change_password(&fx.db, &fx.admin, &ok).unwrap();
        assert!(login_as(&fx, &fx.admin.user.email, "abcdef").is_ok());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::open_memory().unwrap();
        let first = seed(&db, "Root", "root@example.test", "changeme", Utc::now()).unwrap();
        assert_eq!(first.roles_created.len(), 4);
        assert!(first.admin_created);

        let again = seed(&db, "Root", "root@example.test", "changeme", Utc::now()).unwrap();
        assert!(again.roles_created.is_empty());
        assert!(!again.admin_created);
        assert_eq!(db.list_users().unwrap().len(), 1);
    }
}
