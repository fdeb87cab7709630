use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_uuid, Database};
use crate::models::*;

impl Database {
    pub fn insert_role(&self, role: &Role) -> Result<()> {
        self.conn.execute(
            "INSERT INTO roles (id, name, hierarchy_level, permissions) VALUES (?, ?, ?, ?)",
            params![
                role.id.to_string(),
                role.name,
                role.hierarchy_level,
                role.permissions.to_json(),
            ],
        )?;
        Ok(())
    }

    pub fn get_role(&self, id: Uuid) -> Result<Option<Role>> {
        let result = self.conn.query_row(
            "SELECT * FROM roles WHERE id = ?",
            [id.to_string()],
            Self::row_to_role,
        );

        match result {
            Ok(role) => Ok(Some(role)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let result = self.conn.query_row(
            "SELECT * FROM roles WHERE name = ?",
            [name],
            Self::row_to_role,
        );

        match result {
            Ok(role) => Ok(Some(role)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Ordered by hierarchy level, then name.
    pub fn list_roles(&self) -> Result<Vec<Role>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM roles ORDER BY hierarchy_level, name")?;
        let roles = stmt
            .query_map([], Self::row_to_role)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(roles)
    }

    pub fn update_role(&self, role: &Role) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE roles SET name = ?, hierarchy_level = ?, permissions = ? WHERE id = ?",
            params![
                role.name,
                role.hierarchy_level,
                role.permissions.to_json(),
                role.id.to_string(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_role(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM roles WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn count_users_with_role(&self, role_id: Uuid) -> Result<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role_id = ?",
            [role_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn row_to_role(row: &Row) -> rusqlite::Result<Role> {
        let id: String = row.get("id")?;
        let permissions: String = row.get("permissions")?;

        Ok(Role {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            hierarchy_level: row.get("hierarchy_level")?,
            // A damaged permission blob grants nothing rather than failing the row.
            permissions: PermissionSet::from_json(&permissions).unwrap_or_default(),
        })
    }
}
