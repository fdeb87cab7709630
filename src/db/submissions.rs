use anyhow::Result;
use rusqlite::{params, params_from_iter, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_json_object, parse_opt_uuid, parse_text, parse_uuid, Database};
use crate::models::*;

impl Database {
    pub fn insert_submission(&self, sub: &Submission) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO submissions (id, form_type, name, email, company, data, status, lead_id, submitted_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                sub.id.to_string(),
                sub.form_type,
                sub.name,
                sub.email,
                sub.company,
                serde_json::Value::Object(sub.data.clone()).to_string(),
                sub.status.as_str(),
                sub.lead_id.map(|id| id.to_string()),
                sub.submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get_submission(&self, id: Uuid) -> Result<Option<Submission>> {
        let result = self.conn.query_row(
            "SELECT * FROM submissions WHERE id = ?",
            [id.to_string()],
            Self::row_to_submission,
        );

        match result {
            Ok(sub) => Ok(Some(sub)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Submissions whose form type is one of `form_types` (all when empty), newest first.
    pub fn list_submissions(&self, form_types: &[&str]) -> Result<Vec<Submission>> {
        if form_types.is_empty() {
            let mut stmt = self
                .conn
                .prepare("SELECT * FROM submissions ORDER BY submitted_at DESC")?;
            let subs = stmt
                .query_map([], Self::row_to_submission)?
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(subs);
        }

        let placeholders = vec!["?"; form_types.len()].join(", ");
        let sql = format!(
            "SELECT * FROM submissions WHERE form_type IN ({}) ORDER BY submitted_at DESC",
            placeholders
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let subs = stmt
            .query_map(params_from_iter(form_types.iter()), Self::row_to_submission)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subs)
    }

    pub fn find_submission_by_email(&self, form_type: &str, email: &str) -> Result<Option<Submission>> {
        let result = self.conn.query_row(
            r#"SELECT * FROM submissions WHERE form_type = ? AND lower(email) = lower(?)
               ORDER BY submitted_at DESC LIMIT 1"#,
            params![form_type, email],
            Self::row_to_submission,
        );

        match result {
            Ok(sub) => Ok(Some(sub)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_submission_status(
        &self,
        id: Uuid,
        status: SubmissionStatus,
        lead_id: Option<Uuid>,
    ) -> Result<bool> {
        let rows = self.conn.execute(
            "UPDATE submissions SET status = ?, lead_id = ? WHERE id = ?",
            params![
                status.as_str(),
                lead_id.map(|id| id.to_string()),
                id.to_string()
            ],
        )?;
        Ok(rows > 0)
    }

    /// Detach submissions from a lead that is going away and reopen them.
    pub fn reset_submissions_for_lead(&self, lead_id: Uuid) -> Result<usize> {
        let rows = self.conn.execute(
            "UPDATE submissions SET lead_id = NULL, status = ? WHERE lead_id = ?",
            params![SubmissionStatus::New.as_str(), lead_id.to_string()],
        )?;
        Ok(rows)
    }

    pub fn delete_submission(&self, id: Uuid) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM submissions WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    fn row_to_submission(row: &Row) -> rusqlite::Result<Submission> {
        let id: String = row.get("id")?;
        let data: String = row.get("data")?;
        let status: String = row.get("status")?;
        let submitted_at: String = row.get("submitted_at")?;

        Ok(Submission {
            id: parse_uuid(&id)?,
            form_type: row.get("form_type")?,
            name: row.get("name")?,
            email: row.get("email")?,
            company: row.get("company")?,
            data: parse_json_object(&data)?,
            status: parse_text(&status)?,
            lead_id: parse_opt_uuid(row.get("lead_id")?)?,
            submitted_at: parse_datetime(&submitted_at)?,
        })
    }
}
