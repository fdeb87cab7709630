use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::Connection;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

mod activity;
mod call_logs;
mod comments;
mod form_fields;
mod leads;
mod newsletter;
mod reminders;
mod roles;
mod schema;
mod submissions;
mod tags;
mod users;

pub use activity::ActivityFilter;
pub use call_logs::CallLogFilter;
pub use reminders::ReminderFilter;
pub use schema::SCHEMA_VERSION;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at the default location, creating it if needed
    pub fn open() -> Result<Self> {
        let path = Self::default_path()?;
        Self::open_at(path)
    }

    pub fn open_at(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open in-memory database for testing
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn default_path() -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join("leadcrm").join("leadcrm.db"))
    }

    /// Run `f` inside `BEGIN IMMEDIATE` / `COMMIT`, rolling back if it fails.
    pub fn with_transaction<T, E, F>(&self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&Self) -> std::result::Result<T, E>,
        E: From<rusqlite::Error>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(value) => {
                if let Err(e) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(e.into());
                }
                Ok(value)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Make every insert into `table` fail with `message`.
    #[cfg(test)]
    pub(crate) fn fail_inserts_into(&self, table: &str, message: &str) -> Result<()> {
        self.conn.execute_batch(&format!(
            "CREATE TRIGGER fail_{table}_insert BEFORE INSERT ON {table} \
             BEGIN SELECT RAISE(ABORT, '{message}'); END;"
        ))?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        let version = self.get_schema_version()?;

        if version == 0 {
            self.conn
                .execute_batch(&format!("BEGIN TRANSACTION; {} COMMIT;", schema::SCHEMA_V1))?;
            self.set_schema_version(SCHEMA_VERSION)?;
        }

        Ok(())
    }

    fn get_schema_version(&self) -> Result<i32> {
        let result: Result<i32, _> =
            self.conn
                .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                    row.get(0)
                });

        match result {
            Ok(v) => Ok(v),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
            Err(rusqlite::Error::SqliteFailure(err, msg)) => {
                // "no such table" is SQLITE_ERROR
                if err.code == rusqlite::ErrorCode::Unknown
                    && msg.as_ref().map_or(false, |m| m.contains("no such table"))
                {
                    Ok(0)
                } else {
                    Err(rusqlite::Error::SqliteFailure(err, msg).into())
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    fn set_schema_version(&self, version: i32) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?)",
            [version],
        )?;
        Ok(())
    }
}

// Column conversion helpers shared by the row mappers.

fn conversion_error<E>(e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
}

fn text_error(msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, msg.into())
}

pub(crate) fn parse_uuid(s: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(conversion_error)
}

pub(crate) fn parse_opt_uuid(s: Option<String>) -> rusqlite::Result<Option<Uuid>> {
    match s {
        Some(s) if !s.is_empty() => parse_uuid(&s).map(Some),
        _ => Ok(None),
    }
}

pub(crate) fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error)
}

pub(crate) fn parse_opt_datetime(s: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_datetime).transpose()
}

pub(crate) fn parse_opt_date(s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.as_deref()
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(conversion_error))
        .transpose()
}

/// For the model enums whose `FromStr` reports a plain `String`.
pub(crate) fn parse_text<T>(s: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    s.parse().map_err(text_error)
}

pub(crate) fn parse_json_object(
    s: &str,
) -> rusqlite::Result<serde_json::Map<String, serde_json::Value>> {
    match serde_json::from_str::<serde_json::Value>(s).map_err(conversion_error)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Ok(serde_json::Map::new()),
    }
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.get_schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_exist() {
        let db = Database::open_memory().unwrap();

        let tables: Vec<String> = db
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "roles",
            "users",
            "leads",
            "submissions",
            "comments",
            "tags",
            "entity_tags",
            "reminders",
            "call_logs",
            "activity_logs",
            "newsletter",
            "form_fields",
        ] {
            assert!(tables.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("crm.db");
        {
            let db = Database::open_at(path.clone()).unwrap();
            db.insert_role(&crate::models::Role::new(
                "Ops",
                3,
                crate::models::PermissionSet::new(),
            ))
            .unwrap();
        }
        let db = Database::open_at(path).unwrap();
        assert!(db.get_role_by_name("Ops").unwrap().is_some());
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let db = Database::open_memory().unwrap();
        let role = crate::models::Role::new("Temp", 3, crate::models::PermissionSet::new());
        let result: anyhow::Result<()> = db.with_transaction(|tx| {
            tx.insert_role(&role)?;
            anyhow::bail!("abort");
        });
        assert!(result.is_err());
        assert!(db.get_role(role.id).unwrap().is_none());
    }

    #[test]
    fn test_transaction_commits() {
        let db = Database::open_memory().unwrap();
        let role = crate::models::Role::new("Kept", 3, crate::models::PermissionSet::new());
        let result: anyhow::Result<()> = db.with_transaction(|tx| tx.insert_role(&role));
        assert!(result.is_ok());
        assert!(db.get_role(role.id).unwrap().is_some());
    }
}
