use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_opt_uuid, parse_uuid, Database};
use crate::models::*;

impl Database {
    pub fn insert_tag(&self, tag: &Tag) -> Result<()> {
        self.conn.execute(
            "INSERT INTO tags (id, name, color, entity_type, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                tag.id.to_string(),
                tag.name,
                tag.color,
                tag.entity_type,
                tag.created_by.map(|id| id.to_string()),
                tag.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_tag(&self, id: Uuid) -> Result<Option<Tag>> {
        let result = self.conn.query_row(
            "SELECT * FROM tags WHERE id = ?",
            [id.to_string()],
            Self::row_to_tag,
        );

        match result {
            Ok(tag) => Ok(Some(tag)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let result = self.conn.query_row(
            "SELECT * FROM tags WHERE name = ?",
            [name],
            Self::row_to_tag,
        );

        match result {
            Ok(tag) => Ok(Some(tag)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_tags(&self, entity_type: Option<&str>) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM tags WHERE (?1 IS NULL OR entity_type = ?1) ORDER BY name")?;
        let tags = stmt
            .query_map([entity_type], Self::row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    pub fn update_tag(&self, tag: &Tag) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE tags SET name = ?, color = ?, entity_type = ? WHERE id = ?",
            params![tag.name, tag.color, tag.entity_type, tag.id.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// Associations go with the tag.
    pub fn delete_tag(&self, id: Uuid) -> Result<bool> {
        self.conn
            .execute("DELETE FROM entity_tags WHERE tag_id = ?", [id.to_string()])?;
        let rows = self
            .conn
            .execute("DELETE FROM tags WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn insert_entity_tag(&self, link: &EntityTag) -> Result<()> {
        self.conn.execute(
            "INSERT INTO entity_tags (id, tag_id, entity_type, entity_id, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                link.id.to_string(),
                link.tag_id.to_string(),
                link.entity_type,
                link.entity_id.to_string(),
                link.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn entity_tag_exists(&self, tag_id: Uuid, entity_type: &str, entity_id: Uuid) -> Result<bool> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM entity_tags WHERE tag_id = ? AND entity_type = ? AND entity_id = ?",
            params![tag_id.to_string(), entity_type, entity_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Tags attached to one entity.
    pub fn list_entity_tags(&self, entity_type: &str, entity_id: Uuid) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT t.* FROM tags t
               JOIN entity_tags et ON et.tag_id = t.id
               WHERE et.entity_type = ? AND et.entity_id = ?
               ORDER BY t.name"#,
        )?;
        let tags = stmt
            .query_map(params![entity_type, entity_id.to_string()], Self::row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    pub fn delete_entity_tag(&self, tag_id: Uuid, entity_type: &str, entity_id: Uuid) -> Result<bool> {
        let rows = self.conn.execute(
            "DELETE FROM entity_tags WHERE tag_id = ? AND entity_type = ? AND entity_id = ?",
            params![tag_id.to_string(), entity_type, entity_id.to_string()],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_entity_tags_for(&self, entity_type: &str, entity_id: Uuid) -> Result<usize> {
        let rows = self.conn.execute(
            "DELETE FROM entity_tags WHERE entity_type = ? AND entity_id = ?",
            params![entity_type, entity_id.to_string()],
        )?;
        Ok(rows)
    }

    fn row_to_tag(row: &Row) -> rusqlite::Result<Tag> {
        let id: String = row.get("id")?;
        let created_at: String = row.get("created_at")?;

        Ok(Tag {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            color: row.get("color")?,
            entity_type: row.get("entity_type")?,
            created_by: parse_opt_uuid(row.get("created_by")?)?,
            created_at: parse_datetime(&created_at)?,
        })
    }
}
