use std::sync::{Arc, Mutex};

use super::SubmissionSource;
use crate::db::Database;
use crate::error::AppResult;
use crate::models::FormSubmission;
use crate::services::normalize::form_type_aliases;

/// The CRM's own submissions table. Hyphenated and legacy form type names
/// are grouped with their canonical spelling.
pub struct CrmSubmissionSource {
    db: Arc<Mutex<Database>>,
}

impl CrmSubmissionSource {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

impl SubmissionSource for CrmSubmissionSource {
    fn name(&self) -> &'static str {
        "crm"
    }

    fn list(&self, form_type: Option<&str>) -> AppResult<Vec<FormSubmission>> {
        let types = form_type.map(form_type_aliases).unwrap_or_default();
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        let subs = db.list_submissions(&types)?;
        Ok(subs.into_iter().map(FormSubmission::from).collect())
    }
}
