//! Process-wide application state shared by every HTTP handler.
//!
//! Holds the database location and the predictor built at startup. Each
//! request opens its own SQLite connection; the predictor (and the staging
//! models inside it) is read-only after construction.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::db;
use crate::diagnosis::Predictor;

pub struct CoreState {
    db_path: PathBuf,
    predictor: Predictor,
    started_at: Instant,
}

impl CoreState {
    /// Build state around an existing database file. The schema is applied
    /// by the first `open_db` call if it is not already present.
    pub fn new(db_path: impl Into<PathBuf>, predictor: Predictor) -> Self {
        Self {
            db_path: db_path.into(),
            predictor,
            started_at: Instant::now(),
        }
    }

    /// Open a connection to the application database.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
