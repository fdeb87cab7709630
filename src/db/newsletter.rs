use anyhow::Result;
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_uuid, Database};
use crate::models::*;

impl Database {
    pub fn insert_newsletter_entry(&self, entry: &NewsletterEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO newsletter (id, email, date, active) VALUES (?, ?, ?, ?)",
            params![entry.id.to_string(), entry.email, entry.date, entry.active],
        )?;
        Ok(())
    }

    pub fn get_newsletter_entry(&self, id: Uuid) -> Result<Option<NewsletterEntry>> {
        let result = self.conn.query_row(
            "SELECT * FROM newsletter WHERE id = ?",
            [id.to_string()],
            Self::row_to_newsletter_entry,
        );

        match result {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_newsletter_entries(&self) -> Result<Vec<NewsletterEntry>> {
        let mut stmt = self.conn.prepare("SELECT * FROM newsletter ORDER BY email")?;
        let entries = stmt
            .query_map([], Self::row_to_newsletter_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn set_newsletter_active(&self, id: Uuid, active: bool) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE newsletter SET active = ? WHERE id = ?",
            params![active, id.to_string()],
        )?;
        Ok(rows > 0)
    }

    fn row_to_newsletter_entry(row: &Row) -> rusqlite::Result<NewsletterEntry> {
        let id: String = row.get("id")?;

        Ok(NewsletterEntry {
            id: parse_uuid(&id)?,
            email: row.get("email")?,
            date: row.get("date")?,
            active: row.get("active")?,
        })
    }
}
