use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("cannot open {role} store at {path}: {source}")]
    Connect {
        role: &'static str,
        path: String,
        source: rusqlite::Error,
    },
    #[error("constraint violation on {entity}: {detail}")]
    Constraint { entity: &'static str, detail: String },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("no such stage: {0} (expected 0..=3)")]
    InvalidStage(i64),
}

impl MigrateError {
    /// Wrap a rusqlite error raised while writing `entity`, keeping the
    /// offending identifiers visible when the failure is a FK or uniqueness
    /// violation. Anything else passes through untouched.
    pub fn from_write(entity: &'static str, detail: String, err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                MigrateError::Constraint {
                    entity,
                    detail: format!("{detail}: {err}"),
                }
            }
            _ => MigrateError::Rusqlite(err),
        }
    }
}
