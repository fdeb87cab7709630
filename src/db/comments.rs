use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::models::*;

impl Database {
    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO comments (id, lead_id, text, status, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                comment.id.to_string(),
                comment.lead_id.to_string(),
                comment.text,
                comment.status,
                comment.created_by.to_string(),
                comment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Oldest first.
    pub fn list_comments_for_lead(&self, lead_id: Uuid) -> Result<Vec<Comment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM comments WHERE lead_id = ? ORDER BY created_at")?;
        let comments = stmt
            .query_map([lead_id.to_string()], Self::row_to_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    pub fn delete_comments_for_lead(&self, lead_id: Uuid) -> Result<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM comments WHERE lead_id = ?", [lead_id.to_string()])?;
        Ok(rows)
    }

    fn row_to_comment(row: &Row) -> rusqlite::Result<Comment> {
        let id: String = row.get("id")?;
        let lead_id: String = row.get("lead_id")?;
        let created_by: String = row.get("created_by")?;
        let created_at: String = row.get("created_at")?;

        Ok(Comment {
            id: parse_uuid(&id)?,
            lead_id: parse_uuid(&lead_id)?,
            text: row.get("text")?,
            status: row.get("status")?,
            created_by: parse_uuid(&created_by)?,
            created_at: parse_datetime(&created_at)?,
        })
    }
}
