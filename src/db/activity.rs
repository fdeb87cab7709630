use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_json_object, parse_opt_uuid, parse_text, parse_uuid, Database};
use crate::models::*;

/// Query for [`Database::list_activities`]. Entries come back newest first.
#[derive(Debug, Clone)]
pub struct ActivityFilter {
    pub user_id: Option<Uuid>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub action: Option<ActionKind>,
    pub skip: u32,
    pub limit: u32,
}

impl Default for ActivityFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            entity_type: None,
            entity_id: None,
            action: None,
            skip: 0,
            limit: 50,
        }
    }
}

// Activity logs are append-only: insert and read, nothing else.
impl Database {
    pub fn insert_activity(&self, log: &ActivityLog) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO activity_logs (id, user_id, action, description, entity_type, entity_id, metadata, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                log.id.to_string(),
                log.user_id.to_string(),
                log.action.as_str(),
                log.description,
                log.entity_type,
                log.entity_id.map(|id| id.to_string()),
                serde_json::Value::Object(log.metadata.clone()).to_string(),
                log.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn list_activities(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>> {
        let mut stmt = self.conn.prepare(
            r#"SELECT * FROM activity_logs
               WHERE (?1 IS NULL OR user_id = ?1)
                 AND (?2 IS NULL OR entity_type = ?2)
                 AND (?3 IS NULL OR entity_id = ?3)
                 AND (?4 IS NULL OR action = ?4)
               ORDER BY created_at DESC
               LIMIT ?5 OFFSET ?6"#,
        )?;
        let logs = stmt
            .query_map(
                params![
                    filter.user_id.map(|id| id.to_string()),
                    filter.entity_type,
                    filter.entity_id.map(|id| id.to_string()),
                    filter.action.map(|a| a.as_str()),
                    filter.limit,
                    filter.skip,
                ],
                Self::row_to_activity,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(logs)
    }

    /// Timestamp of the newest entry about one entity.
    pub fn latest_activity_at(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Option<DateTime<Utc>>> {
        let latest: Option<String> = self.conn.query_row(
            "SELECT MAX(created_at) FROM activity_logs WHERE entity_type = ? AND entity_id = ?",
            params![entity_type, entity_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(latest.as_deref().map(parse_datetime).transpose()?)
    }

    fn row_to_activity(row: &Row) -> rusqlite::Result<ActivityLog> {
        let id: String = row.get("id")?;
        let user_id: String = row.get("user_id")?;
        let action: String = row.get("action")?;
        let metadata: String = row.get("metadata")?;
        let created_at: String = row.get("created_at")?;

        Ok(ActivityLog {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            action: parse_text(&action)?,
            description: row.get("description")?,
            entity_type: row.get("entity_type")?,
            entity_id: parse_opt_uuid(row.get("entity_id")?)?,
            metadata: parse_json_object(&metadata)?,
            created_at: parse_datetime(&created_at)?,
        })
    }
}
