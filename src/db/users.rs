use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_opt_uuid, parse_uuid, Database};
use crate::models::*;

const PROFILE_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.role_id, u.manager_id,
           r.name AS role_name, m.name AS manager_name
    FROM users u
    LEFT JOIN roles r ON r.id = u.role_id
    LEFT JOIN users m ON m.id = u.manager_id
"#;

impl Database {
    pub fn insert_user(&self, user: &User) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO users (id, name, email, password_hash, role_id, manager_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.role_id.to_string(),
                user.manager_id.map(|id| id.to_string()),
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT * FROM users WHERE id = ?",
            [id.to_string()],
            Self::row_to_user,
        );

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Case-insensitive lookup.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT * FROM users WHERE lower(email) = lower(?)",
            [email],
            Self::row_to_user,
        );

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// First user whose display name matches exactly.
    pub fn find_user_by_name(&self, name: &str) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT * FROM users WHERE name = ? ORDER BY created_at LIMIT 1",
            [name],
            Self::row_to_user,
        );

        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare("SELECT * FROM users ORDER BY name")?;
        let users = stmt
            .query_map([], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Users whose role sits at `level`.
    pub fn list_users_at_level(&self, level: i64) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT u.* FROM users u
               JOIN roles r ON r.id = u.role_id
               WHERE r.hierarchy_level = ?
               ORDER BY u.created_at, u.name"#,
        )?;
        let users = stmt
            .query_map([level], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Direct reports of `manager_id`, optionally limited to one hierarchy level.
    pub fn list_team(&self, manager_id: Uuid, level: Option<i64>) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT u.* FROM users u
               JOIN roles r ON r.id = u.role_id
               WHERE u.manager_id = ?1 AND (?2 IS NULL OR r.hierarchy_level = ?2)
               ORDER BY u.name"#,
        )?;
        let users = stmt
            .query_map(params![manager_id.to_string(), level], Self::row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn update_user(&self, user: &User) -> Result<bool> {
        let rows = self.conn.execute(
            r#"UPDATE users SET name = ?, email = ?, password_hash = ?, role_id = ?, manager_id = ?
               WHERE id = ?"#,
            params![
                user.name,
                user.email,
                user.password_hash,
                user.role_id.to_string(),
                user.manager_id.map(|id| id.to_string()),
                user.id.to_string(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            params![password_hash, id.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// Deletes the user row only. Callers unassign leads and reports first.
    pub fn delete_user(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Detach everyone reporting to `manager_id`. Returns how many rows changed.
    pub fn clear_manager(&self, manager_id: Uuid) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE users SET manager_id = NULL WHERE manager_id = ?",
            [manager_id.to_string()],
        )?;
        Ok(rows)
    }

    pub fn get_user_profile(&self, id: Uuid) -> Result<Option<UserProfile>> {
        let sql = format!("{} WHERE u.id = ?", PROFILE_SELECT);
        let result = self
            .conn
            .query_row(&sql, [id.to_string()], Self::row_to_profile);

        match result {
            Ok(p) => Ok(Some(p)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Profiles filtered by role id and/or manager id.
    pub fn list_user_profiles(
        &self,
        role_id: Option<Uuid>,
        manager_id: Option<Uuid>,
    ) -> Result<Vec<UserProfile>> {
        let sql = format!(
            "{} WHERE (?1 IS NULL OR u.role_id = ?1) AND (?2 IS NULL OR u.manager_id = ?2) ORDER BY u.name",
            PROFILE_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let profiles = stmt
            .query_map(
                params![
                    role_id.map(|id| id.to_string()),
                    manager_id.map(|id| id.to_string())
                ],
                Self::row_to_profile,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    fn row_to_user(row: &Row) -> rusqlite::Result<User> {
        let id: String = row.get("id")?;
        let role_id: String = row.get("role_id")?;
        let created_at: String = row.get("created_at")?;

        Ok(User {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            role_id: parse_uuid(&role_id)?,
            manager_id: parse_opt_uuid(row.get("manager_id")?)?,
            created_at: parse_datetime(&created_at)?,
        })
    }

    fn row_to_profile(row: &Row) -> rusqlite::Result<UserProfile> {
        let id: String = row.get("id")?;
        let role_id: String = row.get("role_id")?;

        Ok(UserProfile {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            email: row.get("email")?,
            role_id: parse_uuid(&role_id)?,
            role_name: row.get("role_name")?,
            manager_id: parse_opt_uuid(row.get("manager_id")?)?,
            manager_name: row.get("manager_name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_role(db: &Database, name: &str, level: i64) -> Role {
        let role = Role::new(name, level, PermissionSet::new());
        db.insert_role(&role).unwrap();
        role
    }

    #[test]
    fn test_user_crud_and_lookup() {
        let db = Database::open_memory().unwrap();
        let role = seed_role(&db, ROLE_SALES_EXECUTIVE, 2);
        let user = User::new("Sam".into(), "Sam@Example.com".into(), "h".into(), role.id);
        db.insert_user(&user).unwrap();

        assert_eq!(db.get_user(user.id).unwrap().unwrap(), user);
        assert_eq!(
            db.get_user_by_email("sam@example.com").unwrap().unwrap().id,
            user.id
        );
        assert_eq!(db.find_user_by_name("Sam").unwrap().unwrap().id, user.id);
        assert!(db.find_user_by_name("Nobody").unwrap().is_none());

        assert!(db.update_password(user.id, "h2").unwrap());
        assert_eq!(db.get_user(user.id).unwrap().unwrap().password_hash, "h2");

        assert!(db.delete_user(user.id).unwrap());
        assert!(db.get_user(user.id).unwrap().is_none());
    }

    #[test]
    fn test_team_and_profiles() {
        let db = Database::open_memory().unwrap();
        let mgr_role = seed_role(&db, ROLE_SALES_MANAGER, 1);
        let exec_role = seed_role(&db, ROLE_SALES_EXECUTIVE, 2);

        let manager = User::new("Mia".into(), "mia@x.com".into(), "h".into(), mgr_role.id);
        db.insert_user(&manager).unwrap();
        let mut exec = User::new("Eli".into(), "eli@x.com".into(), "h".into(), exec_role.id);
        exec.manager_id = Some(manager.id);
        db.insert_user(&exec).unwrap();

        let team = db.list_team(manager.id, Some(2)).unwrap();
        assert_eq!(team.len(), 1);
        assert!(db.list_team(manager.id, Some(1)).unwrap().is_empty());
        assert_eq!(db.list_users_at_level(1).unwrap()[0].id, manager.id);

        let profile = db.get_user_profile(exec.id).unwrap().unwrap();
        assert_eq!(profile.role_name.as_deref(), Some(ROLE_SALES_EXECUTIVE));
        assert_eq!(profile.manager_name.as_deref(), Some("Mia"));

        let filtered = db
            .list_user_profiles(Some(exec_role.id), Some(manager.id))
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(db.list_user_profiles(None, None).unwrap().len(), 2);

        assert_eq!(db.clear_manager(manager.id).unwrap(), 1);
        assert!(db.get_user(exec.id).unwrap().unwrap().manager_id.is_none());
    }

    #[test]
    fn test_role_in_use_count() {
        let db = Database::open_memory().unwrap();
        let role = seed_role(&db, "Any", 3);
        db.insert_user(&User::new("A".into(), "a@x.com".into(), "h".into(), role.id))
            .unwrap();
        assert_eq!(db.count_users_with_role(role.id).unwrap(), 1);
    }
}
