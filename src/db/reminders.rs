use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_opt_datetime, parse_opt_uuid, parse_text, parse_uuid, Database};
use crate::models::*;

/// Optional constraints for [`Database::list_reminders`].
#[derive(Debug, Clone, Default)]
pub struct ReminderFilter {
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub completed: Option<bool>,
    /// Only reminders due at or after this instant.
    pub due_from: Option<DateTime<Utc>>,
}

impl Database {
    pub fn insert_reminder(&self, reminder: &Reminder) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO reminders (
                id, lead_id, user_id, title, description, due_date, status,
                completed, created_at, completed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                reminder.id.to_string(),
                reminder.lead_id.map(|id| id.to_string()),
                reminder.user_id.to_string(),
                reminder.title,
                reminder.description,
                reminder.due_date.to_rfc3339(),
                reminder.status.as_str(),
                reminder.completed,
                reminder.created_at.to_rfc3339(),
                reminder.completed_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_reminder(&self, id: Uuid) -> Result<Option<Reminder>> {
        let result = self.conn.query_row(
            "SELECT * FROM reminders WHERE id = ?",
            [id.to_string()],
            Self::row_to_reminder,
        );

        match result {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Soonest due first.
    pub fn list_reminders(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM reminders
               WHERE (?1 IS NULL OR lead_id = ?1)
                 AND (?2 IS NULL OR user_id = ?2)
                 AND (?3 IS NULL OR completed = ?3)
                 AND (?4 IS NULL OR due_date >= ?4)
               ORDER BY due_date"#,
        )?;
        let reminders = stmt
            .query_map(
                params![
                    filter.lead_id.map(|id| id.to_string()),
                    filter.user_id.map(|id| id.to_string()),
                    filter.completed,
                    filter.due_from.map(|t| t.to_rfc3339()),
                ],
                Self::row_to_reminder,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reminders)
    }

    pub fn update_reminder(&self, reminder: &Reminder) -> Result<bool> {
        let rows = self.conn.execute(
            r#"UPDATE reminders SET lead_id = ?, user_id = ?, title = ?, description = ?,
                due_date = ?, status = ?, completed = ?, completed_at = ?
               WHERE id = ?"#,
            params![
                reminder.lead_id.map(|id| id.to_string()),
                reminder.user_id.to_string(),
                reminder.title,
                reminder.description,
                reminder.due_date.to_rfc3339(),
                reminder.status.as_str(),
                reminder.completed,
                reminder.completed_at.map(|t| t.to_rfc3339()),
                reminder.id.to_string(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_reminder(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn delete_reminders_for_lead(&self, lead_id: Uuid) -> Result<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM reminders WHERE lead_id = ?", [lead_id.to_string()])?;
        Ok(rows)
    }

    fn row_to_reminder(row: &Row) -> rusqlite::Result<Reminder> {
        let id: String = row.get("id")?;
        let user_id: String = row.get("user_id")?;
        let due_date: String = row.get("due_date")?;
        let status: String = row.get("status")?;
        let created_at: String = row.get("created_at")?;

        Ok(Reminder {
            id: parse_uuid(&id)?,
            lead_id: parse_opt_uuid(row.get("lead_id")?)?,
            user_id: parse_uuid(&user_id)?,
            title: row.get("title")?,
            description: row.get("description")?,
            due_date: parse_datetime(&due_date)?,
            status: parse_text(&status)?,
            completed: row.get("completed")?,
            created_at: parse_datetime(&created_at)?,
            completed_at: parse_opt_datetime(row.get("completed_at")?)?,
        })
    }
}
