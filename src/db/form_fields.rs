use anyhow::Result;
use rusqlite::{params, Row};

use super::{parse_text, parse_uuid, Database};
use crate::models::*;

impl Database {
    pub fn insert_form_field(&self, field: &FormField) -> Result<()> {
        self.conn.execute(
            r#"INSERT INTO form_fields (id, form_type, field_name, field_label, field_type, required, options)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                field.id.to_string(),
                field.form_type,
                field.field_name,
                field.field_label,
                field.field_type.as_str(),
                field.required,
                field.options,
            ],
        )?;
        Ok(())
    }

    /// In insertion order.
    pub fn list_form_fields(&self, form_type: &str) -> Result<Vec<FormField>> {
        let mut stmt = self
            .conn
            .prepare("SELECT * FROM form_fields WHERE form_type = ? ORDER BY rowid")?;
        let fields = stmt
            .query_map([form_type], Self::row_to_form_field)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(fields)
    }

    fn row_to_form_field(row: &Row) -> rusqlite::Result<FormField> {
        let id: String = row.get("id")?;
        let field_type: String = row.get("field_type")?;

        Ok(FormField {
            id: parse_uuid(&id)?,
            form_type: row.get("form_type")?,
            field_name: row.get("field_name")?,
            field_label: row.get("field_label")?,
            field_type: parse_text(&field_type)?,
            required: row.get("required")?,
            options: row.get("options")?,
        })
    }
}
