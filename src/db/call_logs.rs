use anyhow::Result;
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_opt_datetime, parse_text, parse_uuid, Database};
use crate::models::*;

#[derive(Debug, Clone, Default)]
pub struct CallLogFilter {
    pub lead_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

impl Database {
    pub fn insert_call_log(&self, log: &CallLog) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO call_logs (
                id, lead_id, user_id, stage, activity_type, objective, planning_notes,
                post_meeting_notes, follow_up_notes, challenges, secured_order, dollar_value,
                meeting_date, is_completed, is_cancelled, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                log.id.to_string(),
                log.lead_id.to_string(),
                log.user_id.to_string(),
                log.stage.map(|s| s.as_str()),
                log.activity_type,
                log.objective,
                log.planning_notes,
                log.post_meeting_notes,
                log.follow_up_notes,
                log.challenges,
                log.secured_order,
                log.dollar_value,
                log.meeting_date.map(|t| t.to_rfc3339()),
                log.is_completed,
                log.is_cancelled,
                log.created_at.to_rfc3339(),
                log.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_call_log(&self, id: Uuid) -> Result<Option<CallLog>> {
        let result = self.conn.query_row(
            "SELECT * FROM call_logs WHERE id = ?",
            [id.to_string()],
            Self::row_to_call_log,
        );

        match result {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Logs whose lead still exists, latest meeting first.
    pub fn list_call_logs(&self, filter: &CallLogFilter) -> Result<Vec<CallLog>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT c.* FROM call_logs c
               WHERE EXISTS (SELECT 1 FROM leads l WHERE l.id = c.lead_id)
                 AND (?1 IS NULL OR c.lead_id = ?1)
                 AND (?2 IS NULL OR c.user_id = ?2)
               ORDER BY c.meeting_date DESC, c.created_at DESC"#,
        )?;
        let logs = stmt
            .query_map(
                params![
                    filter.lead_id.map(|id| id.to_string()),
                    filter.user_id.map(|id| id.to_string()),
                ],
                Self::row_to_call_log,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Every log by any of `users`, for reporting.
    pub fn list_call_logs_by_users(&self, users: &[Uuid]) -> Result<Vec<CallLog>> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; users.len()].join(", ");
        let sql = format!(
            "SELECT * FROM call_logs WHERE user_id IN ({}) ORDER BY created_at",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let logs = stmt
            .query_map(
                params_from_iter(users.iter().map(|id| id.to_string())),
                Self::row_to_call_log,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    pub fn update_call_log(&self, log: &CallLog) -> Result<bool> {
        let rows = self.conn.execute(
            r#"UPDATE call_logs SET stage = ?, activity_type = ?, objective = ?, planning_notes = ?,
                post_meeting_notes = ?, follow_up_notes = ?, challenges = ?, secured_order = ?,
                dollar_value = ?, meeting_date = ?, is_completed = ?, is_cancelled = ?, updated_at = ?
               WHERE id = ?"#,
            params![
                log.stage.map(|s| s.as_str()),
                log.activity_type,
                log.objective,
                log.planning_notes,
                log.post_meeting_notes,
                log.follow_up_notes,
                log.challenges,
                log.secured_order,
                log.dollar_value,
                log.meeting_date.map(|t| t.to_rfc3339()),
                log.is_completed,
                log.is_cancelled,
                log.updated_at.to_rfc3339(),
                log.id.to_string(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_call_log(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM call_logs WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    pub fn delete_call_logs_for_lead(&self, lead_id: Uuid) -> Result<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM call_logs WHERE lead_id = ?", [lead_id.to_string()])?;
        Ok(rows)
    }

    fn row_to_call_log(row: &Row) -> rusqlite::Result<CallLog> {
        let id: String = row.get("id")?;
        let lead_id: String = row.get("lead_id")?;
        let user_id: String = row.get("user_id")?;
        let stage: Option<String> = row.get("stage")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(CallLog {
            id: parse_uuid(&id)?,
            lead_id: parse_uuid(&lead_id)?,
            user_id: parse_uuid(&user_id)?,
            stage: stage
                .filter(|s| !s.is_empty())
                .map(|s| parse_text::<Stage>(&s))
                .transpose()?,
            activity_type: row.get("activity_type")?,
            objective: row.get("objective")?,
            planning_notes: row.get("planning_notes")?,
            post_meeting_notes: row.get("post_meeting_notes")?,
            follow_up_notes: row.get("follow_up_notes")?,
            challenges: row.get("challenges")?,
            secured_order: row.get("secured_order")?,
            dollar_value: row.get("dollar_value")?,
            meeting_date: parse_opt_datetime(row.get("meeting_date")?)?,
            is_completed: row.get("is_completed")?,
            is_cancelled: row.get("is_cancelled")?,
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
        })
    }
}
