use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags, params};
use tracing::debug;

use crate::config::SelectionSection;
use crate::error::{SplitError, StoreError};
use crate::labels::{LabelHierarchy, SmellKind, SmellLabel};
use crate::repository::{Repository, parse_upload_date};

use super::LabelStore;

/// SQLite-backed implementation of `LabelStore`.
///
/// Holds one connection for the lifetime of a batch run; queries never write.
#[derive(Debug)]
pub struct SqliteLabelStore {
    conn: Mutex<Connection>,
}

impl SqliteLabelStore {
    /// Open an existing label database read-only.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(StoreError::Sqlite)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-open connection (fixtures, in-memory databases).
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_label(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawLabel> {
        Ok(RawLabel {
            kind: row.get(0)?,
            class_name: row.get(1)?,
            component: row.get(2)?,
            method: row.get(3)?,
        })
    }

    fn row_to_repository(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRepository> {
        Ok(RawRepository {
            solution_id: row.get(0)?,
            name: row.get(1)?,
            repository_link: row.get(2)?,
            upload_date: row.get(3)?,
        })
    }
}

struct RawLabel {
    kind: String,
    class_name: String,
    component: String,
    method: Option<String>,
}

impl RawLabel {
    fn into_label(self) -> Result<SmellLabel, SplitError> {
        Ok(SmellLabel {
            kind: SmellKind::parse(&self.kind)?,
            class_name: self.class_name,
            component: self.component,
            method: self.method.filter(|m| !m.is_empty()),
        })
    }
}

struct RawRepository {
    solution_id: String,
    name: String,
    repository_link: String,
    upload_date: String,
}

impl RawRepository {
    fn into_repository(self) -> Result<Repository, StoreError> {
        let upload_date = parse_upload_date(&self.upload_date).ok_or_else(|| StoreError::BadRow {
            table: "solutions",
            message: format!(
                "unparseable upload_date `{}` for {}",
                self.upload_date, self.solution_id
            ),
        })?;
        Ok(Repository::new(
            self.solution_id,
            self.name,
            &self.repository_link,
            upload_date,
        ))
    }
}

#[async_trait::async_trait]
impl LabelStore for SqliteLabelStore {
    async fn fetch_labels(
        &self,
        solution_id: &str,
        smell_name: &str,
    ) -> crate::error::Result<LabelHierarchy> {
        let raw = {
            let conn = self.conn.lock().expect("label store mutex poisoned");
            let mut stmt = conn
                .prepare_cached(
                    "SELECT type, class, component, method FROM smells
                     WHERE solution_id = ?1 AND name = ?2
                     ORDER BY id",
                )
                .map_err(StoreError::Sqlite)?;
            let rows = stmt
                .query_map(params![solution_id, smell_name], Self::row_to_label)
                .map_err(StoreError::Sqlite)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::Sqlite)?;
            rows
        };

        let labels = raw
            .into_iter()
            .map(RawLabel::into_label)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(solution_id, smell = smell_name, rows = labels.len(), "Fetched labels");

        Ok(LabelHierarchy::from_labels(smell_name, &labels)?)
    }

    async fn fetch_candidates(
        &self,
        selection: &SelectionSection,
        offset: u64,
        limit: u64,
    ) -> crate::error::Result<Vec<Repository>> {
        let raw = {
            let conn = self.conn.lock().expect("label store mutex poisoned");
            let mut stmt = conn
                .prepare_cached(
                    "SELECT s.solution_id, s.name, s.repository_link, s.upload_date
                     FROM solutions s
                     JOIN solution_smells ss
                       ON ss.solution_id = s.solution_id AND ss.smell_name = ?1
                     WHERE ss.severity >= ?2 AND s.prog_language = ?3
                     ORDER BY s.name DESC, s.solution_id DESC
                     LIMIT ?4 OFFSET ?5",
                )
                .map_err(StoreError::Sqlite)?;
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let offset = i64::try_from(offset).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(
                    params![
                        selection.smell,
                        selection.min_severity,
                        selection.language,
                        limit,
                        offset
                    ],
                    Self::row_to_repository,
                )
                .map_err(StoreError::Sqlite)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(StoreError::Sqlite)?;
            rows
        };

        let repositories = raw
            .into_iter()
            .map(RawRepository::into_repository)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(offset, limit, found = repositories.len(), "Fetched candidate page");
        Ok(repositories)
    }
}
