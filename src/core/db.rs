use crate::core::config::StoreConfig;
use crate::core::error::MigrateError;
use rusqlite::Connection;
use std::time::Duration;

/// Open one of the two stores. `role` is "source" or "destination" and only
/// feeds the error message.
pub fn db_connect(role: &'static str, config: &StoreConfig) -> Result<Connection, MigrateError> {
    let wrap = |source| MigrateError::Connect {
        role,
        path: config.path.display().to_string(),
        source,
    };
    let conn = Connection::open(&config.path).map_err(wrap)?;
    conn.busy_timeout(Duration::from_secs(config.busy_timeout_secs))
        .map_err(wrap)?;
    conn.query_row("PRAGMA journal_mode=WAL;", [], |_| Ok(()))
        .map_err(wrap)?;
    conn.execute("PRAGMA foreign_keys=ON;", []).map_err(wrap)?;
    Ok(conn)
}
