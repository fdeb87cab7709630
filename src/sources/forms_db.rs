use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::SubmissionSource;
use crate::error::AppResult;
use crate::models::{FormSubmission, SubmissionStatus};

/// Which rows of which table make up one form type.
#[derive(Debug, Clone, Copy)]
struct FormTable {
    label: &'static str,
    table: &'static str,
    /// `Some(true)`: rows with a demo date only; `Some(false)`: rows without.
    demo: Option<bool>,
}

const NEWSLETTER_TABLE: &str = "newsletter_subscriptions";

const CONTACT: FormTable = FormTable {
    label: "contact",
    table: "contact_forms",
    demo: Some(false),
};
const DEMO: FormTable = FormTable {
    label: "demo",
    table: "contact_forms",
    demo: Some(true),
};
const BROCHURE: FormTable = FormTable {
    label: "brochure",
    table: "brochure_forms",
    demo: None,
};
const PRODUCT_PROFILE: FormTable = FormTable {
    label: "product-profile",
    table: "product_profile_forms",
    demo: None,
};
const TALK: FormTable = FormTable {
    label: "talk",
    table: "talk_to_sales_forms",
    demo: None,
};
const NEWSLETTER: FormTable = FormTable {
    label: "newsletter",
    table: NEWSLETTER_TABLE,
    demo: None,
};

const ALL_TABLES: [FormTable; 6] = [CONTACT, DEMO, BROCHURE, PRODUCT_PROFILE, TALK, NEWSLETTER];

fn table_for(form_type: &str) -> Option<FormTable> {
    let table = match form_type {
        "contact" | "general" => CONTACT,
        "demo" => DEMO,
        "brochure" => BROCHURE,
        "product-profile" | "product_profile" => PRODUCT_PROFILE,
        "talk" | "talk_to_sales" => TALK,
        "newsletter" => NEWSLETTER,
        _ => return None,
    };
    Some(table)
}

/// Website forms kept in a separate SQLite file, one table per form.
pub struct FormsDbSource {
    path: PathBuf,
}

impl FormsDbSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn open(&self) -> anyhow::Result<Connection> {
        Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open forms database {}", self.path.display()))
    }

    fn read_table(
        conn: &Connection,
        form: FormTable,
        label: &str,
    ) -> anyhow::Result<Vec<FormSubmission>> {
        let exists: u32 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            [form.table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            tracing::warn!(table = form.table, "forms database has no such table");
            return Ok(Vec::new());
        }

        let newsletter = form.table == NEWSLETTER_TABLE;
        let time_column = if newsletter { "subscribed_at" } else { "submitted_at" };
        let filter = match form.demo {
            Some(true) => "WHERE demo_date IS NOT NULL",
            Some(false) => "WHERE demo_date IS NULL",
            None => "",
        };
        let sql = format!(
            "SELECT * FROM {} {} ORDER BY {} DESC",
            form.table, filter, time_column
        );

        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut fields = Map::new();
            for (i, name) in columns.iter().enumerate() {
                if let Some(value) = json_value(row.get_ref(i)?) {
                    fields.insert(name.clone(), value);
                }
            }
            out.push(to_submission(fields, label, time_column, newsletter));
        }
        Ok(out)
    }
}

impl SubmissionSource for FormsDbSource {
    fn name(&self) -> &'static str {
        "forms_db"
    }

    fn list(&self, form_type: Option<&str>) -> AppResult<Vec<FormSubmission>> {
        let selected: Vec<(FormTable, String)> = match form_type {
            Some(ft) => match table_for(ft) {
                Some(table) => vec![(table, ft.to_string())],
                None => return Ok(Vec::new()),
            },
            None => ALL_TABLES
                .iter()
                .map(|t| (*t, t.label.to_string()))
                .collect(),
        };

        let conn = self.open()?;
        let mut out = Vec::new();
        for (table, label) in selected {
            out.extend(Self::read_table(&conn, table, &label)?);
        }
        out.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(out)
    }
}

fn json_value(value: ValueRef<'_>) -> Option<Value> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(Value::from(i)),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map(Value::Number),
        ValueRef::Text(t) => Some(Value::String(String::from_utf8_lossy(t).into_owned())),
        ValueRef::Blob(b) => Some(Value::String(hex::encode(b))),
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// SQLite timestamps arrive as RFC 3339 or as `YYYY-MM-DD HH:MM:SS[.f]`
/// without a zone, which is taken as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn to_submission(
    mut fields: Map<String, Value>,
    label: &str,
    time_column: &str,
    newsletter: bool,
) -> FormSubmission {
    let id = text(&fields, "id");
    let email = text(&fields, "email");
    let submitted_at = parse_timestamp(&text(&fields, time_column)).unwrap_or_default();

    if newsletter {
        let mut data = Map::new();
        data.insert("email".to_string(), Value::String(email.clone()));
        return FormSubmission {
            id,
            form_type: label.to_string(),
            name: String::new(),
            email,
            company: String::new(),
            submitted_at,
            data,
            status: SubmissionStatus::New,
            lead_id: None,
        };
    }

    let name = format!("{} {}", text(&fields, "first_name"), text(&fields, "last_name"))
        .trim()
        .to_string();
    let company = match text(&fields, "company") {
        c if !c.is_empty() => c,
        _ => text(&fields, "company_name"),
    };
    fields.remove("id");
    fields.remove(time_column);

    FormSubmission {
        id,
        form_type: label.to_string(),
        name,
        email,
        company,
        submitted_at,
        data: fields,
        status: SubmissionStatus::New,
        lead_id: None,
    }
}
