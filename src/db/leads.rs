use anyhow::Result;
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_opt_date, parse_opt_uuid, parse_text, parse_uuid, Database};
use crate::models::*;

impl Database {
    pub fn insert_lead(&self, lead: &Lead) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO leads (
                id, name, email, phone, company, designation, source_type, source,
                status, stage, assigned_to, assigned, created_by, follow_up_required,
                follow_up_date, follow_up_time, follow_up_status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                lead.id.to_string(),
                lead.name,
                lead.email,
                lead.phone,
                lead.company,
                lead.designation,
                lead.source_type,
                lead.source,
                lead.status,
                lead.stage.map(|s| s.as_str()),
                lead.assigned_to.map(|id| id.to_string()),
                lead.assigned,
                lead.created_by.map(|id| id.to_string()),
                lead.follow_up_required,
                lead.follow_up_date.map(|d| d.format("%Y-%m-%d").to_string()),
                lead.follow_up_time,
                lead.follow_up_status.as_str(),
                lead.created_at.to_rfc3339(),
                lead.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_lead(&self, id: Uuid) -> Result<Option<Lead>> {
        let result = self.conn.query_row(
            "SELECT * FROM leads WHERE id = ?",
            [id.to_string()],
            Self::row_to_lead,
        );

        match result {
            Ok(lead) => Ok(Some(lead)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Every lead, newest first.
    pub fn list_leads(&self) -> Result<Vec<Lead>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM leads ORDER BY created_at DESC")?;
        let leads = stmt
            .query_map([], Self::row_to_lead)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leads)
    }

    /// Leads assigned to any of `assignees`, newest first.
    pub fn list_leads_assigned_to_any(&self, assignees: &[Uuid]) -> Result<Vec<Lead>> {
        if assignees.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; assignees.len()].join(", ");
        let sql = format!(
            "SELECT * FROM leads WHERE assigned_to IN ({}) ORDER BY created_at DESC",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let leads = stmt
            .query_map(
                params_from_iter(assignees.iter().map(|id| id.to_string())),
                Self::row_to_lead,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leads)
    }

    /// Leads owned by one user, matched by id or by the legacy display name.
    pub fn list_leads_owned_by(&self, user_id: Uuid, user_name: &str) -> Result<Vec<Lead>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM leads WHERE assigned_to = ? OR assigned = ? ORDER BY created_at DESC",
        )?;
        let leads = stmt
            .query_map(params![user_id.to_string(), user_name], Self::row_to_lead)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leads)
    }

    /// Leads not in a won or lost state.
    pub fn list_open_leads(&self) -> Result<Vec<Lead>> {
        let placeholders = vec!["?"; CLOSED_STATUSES.len()].join(", ");
        let sql = format!(
            "SELECT * FROM leads WHERE status NOT IN ({}) ORDER BY created_at",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let leads = stmt
            .query_map(params_from_iter(CLOSED_STATUSES.iter()), Self::row_to_lead)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leads)
    }

    pub fn update_lead(&self, lead: &Lead) -> Result<bool> {
        let rows = self.conn.execute(
            r#"UPDATE leads SET
                name = ?, email = ?, phone = ?, company = ?, designation = ?,
                source_type = ?, source = ?, status = ?, stage = ?, assigned_to = ?,
                assigned = ?, follow_up_required = ?, follow_up_date = ?,
                follow_up_time = ?, follow_up_status = ?, updated_at = ?
            WHERE id = ?"#,
            params![
                lead.name,
                lead.email,
                lead.phone,
                lead.company,
                lead.designation,
                lead.source_type,
                lead.source,
                lead.status,
                lead.stage.map(|s| s.as_str()),
                lead.assigned_to.map(|id| id.to_string()),
                lead.assigned,
                lead.follow_up_required,
                lead.follow_up_date.map(|d| d.format("%Y-%m-%d").to_string()),
                lead.follow_up_time,
                lead.follow_up_status.as_str(),
                lead.updated_at.to_rfc3339(),
                lead.id.to_string(),
            ],
        )?;
        Ok(rows > 0)
    }

    pub fn set_lead_stage(&self, id: Uuid, stage: Stage) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE leads SET stage = ?, updated_at = ? WHERE id = ?",
            params![stage.as_str(), chrono::Utc::now().to_rfc3339(), id.to_string()],
        )?;
        Ok(rows > 0)
    }

    /// Release every lead held by a user. The name only matches legacy rows
    /// that carry no assignee id, since names are not unique.
    pub fn unassign_leads_of(&self, user_id: Uuid, user_name: &str) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE leads SET assigned_to = NULL, assigned = ?
             WHERE assigned_to = ? OR (assigned_to IS NULL AND assigned = ?)",
            params![UNASSIGNED, user_id.to_string(), user_name],
        )?;
        Ok(rows)
    }

    /// Removes only the lead row; children must be gone already.
    pub fn delete_lead_row(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM leads WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    fn row_to_lead(row: &Row) -> rusqlite::Result<Lead> {
        let id: String = row.get("id")?;
        let stage: Option<String> = row.get("stage")?;
        let follow_up_status: String = row.get("follow_up_status")?;
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        Ok(Lead {
            id: parse_uuid(&id)?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            company: row.get("company")?,
            designation: row.get("designation")?,
            source_type: row.get("source_type")?,
            source: row.get("source")?,
            status: row.get("status")?,
            stage: stage
                .filter(|s| !s.is_empty())
                .map(|s| parse_text::<Stage>(&s))
                .transpose()?,
            assigned_to: parse_opt_uuid(row.get("assigned_to")?)?,
            assigned: row.get("assigned")?,
            created_by: parse_opt_uuid(row.get("created_by")?)?,
            follow_up_required: row.get("follow_up_required")?,
            follow_up_date: parse_opt_date(row.get("follow_up_date")?)?,
            follow_up_time: row.get("follow_up_time")?,
            follow_up_status: parse_text(&follow_up_status)?,
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
        })
    }
}
