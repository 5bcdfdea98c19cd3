pub mod repository;
pub mod seed;
pub mod sqlite;

pub use repository::*;
pub use seed::*;
pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{entity_type} with id {id} already exists")]
    AlreadyExists { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    /// A stored value could not be decoded.
    #[error("Corrupt stored value: {0}")]
    CorruptRecord(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
