//! Where unified form submissions are read from.
//!
//! The CRM's own `submissions` table is the default. Deployments that keep
//! website forms in a separate SQLite file can point the server at it
//! instead; that file is only ever opened read-only.

mod crm;
mod forms_db;

pub use crm::CrmSubmissionSource;
pub use forms_db::FormsDbSource;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::db::Database;
use crate::error::AppResult;
use crate::models::FormSubmission;

pub trait SubmissionSource: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Newest first. `None` lists every form type.
    fn list(&self, form_type: Option<&str>) -> AppResult<Vec<FormSubmission>>;
}

/// Pick the source once at start-up.
pub fn select(
    db: Arc<Mutex<Database>>,
    use_forms_db: bool,
    forms_db_path: Option<PathBuf>,
) -> Arc<dyn SubmissionSource> {
    match (use_forms_db, forms_db_path) {
        (true, Some(path)) => {
            tracing::info!(path = %path.display(), "reading form submissions from external database");
            Arc::new(FormsDbSource::new(path))
        }
        (true, None) => {
            tracing::warn!("external forms database enabled without a path; using CRM submissions");
            Arc::new(CrmSubmissionSource::new(db))
        }
        (false, _) => Arc::new(CrmSubmissionSource::new(db)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        let db = Arc::new(Mutex::new(Database::open_memory().unwrap()));
        assert_eq!(select(db.clone(), false, None).name(), "crm");
        assert_eq!(select(db.clone(), true, None).name(), "crm");
        assert_eq!(
            select(db, true, Some(PathBuf::from("/tmp/forms.db"))).name(),
            "forms_db"
        );
    }
}
