//! Post-copy status reconciliation in the destination store.
//!
//! Copied build targets carry statuses from the old system, but the
//! artifacts behind a "succeeded" target were not migrated, so success is no
//! longer trustworthy. Phase A demotes every succeeded target to a
//! rebuildable state: `pending` when the parent build has a git reference to
//! rebuild from, `importing` when the only recovery path is re-importing
//! prior artifacts. Phase B then sweeps `failed` targets back to `pending` a
//! fixed number of times. Anything still failed after the last sweep is
//! reported, never swallowed.

use crate::core::error::MigrateError;
use rusqlite::Connection;

/// Fixed number of Phase B sweeps. Historical value; kept literal rather
/// than replaced with a convergence check so re-runs behave identically to
/// the original tool.
pub const RETRY_SWEEPS: usize = 4;

/// A target still failed after the final retry sweep.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExhaustedTarget {
    pub id: i64,
    pub build_id: i64,
    pub target: String,
}

#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct RetryOutcome {
    /// Failed targets flipped to pending, summed over all sweeps.
    pub transitioned: usize,
    /// Targets that remain failed after the retry budget is spent.
    pub exhausted: Vec<ExhaustedTarget>,
}

/// Phase A. Targets already pending or importing are left alone; only
/// formerly-succeeded rows are demoted. Returns the number of rows touched.
pub fn ensure_rebuild(conn: &Connection) -> Result<usize, MigrateError> {
    let n = conn.execute(
        "UPDATE build_target
         SET status = CASE
             WHEN (SELECT git_ref FROM build WHERE build.id = build_target.build_id) IS NOT NULL
                 THEN 'pending'
             ELSE 'importing'
         END
         WHERE status = 'succeeded'",
        [],
    )?;
    Ok(n)
}

fn sweep_failed(conn: &Connection) -> Result<usize, MigrateError> {
    let n = conn.execute(
        "UPDATE build_target SET status = 'pending' WHERE status = 'failed'",
        [],
    )?;
    Ok(n)
}

fn exhausted_failed(conn: &Connection) -> Result<Vec<ExhaustedTarget>, MigrateError> {
    let mut stmt = conn.prepare(
        "SELECT id, build_id, target FROM build_target WHERE status = 'failed' ORDER BY id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(ExhaustedTarget {
            id: row.get(0)?,
            build_id: row.get(1)?,
            target: row.get(2)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<_>>()?)
}

/// Phase B. Exactly [`RETRY_SWEEPS`] passes of failed -> pending, then a
/// final census of anything still failed. No convergence shortcut: the
/// sweep count is the only bound.
pub fn retry_failed(conn: &Connection) -> Result<RetryOutcome, MigrateError> {
    let mut outcome = RetryOutcome::default();
    for _ in 0..RETRY_SWEEPS {
        outcome.transitioned += sweep_failed(conn)?;
    }
    outcome.exhausted = exhausted_failed(conn)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn dest_with(rows: &str) -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&format!(
            "CREATE TABLE build (id INTEGER PRIMARY KEY, package_id INTEGER,
                                 submitted_on INTEGER, git_ref TEXT, status TEXT NOT NULL);
             CREATE TABLE build_target (id INTEGER PRIMARY KEY, build_id INTEGER NOT NULL,
                                        target TEXT NOT NULL, status TEXT NOT NULL);
             {rows}"
        ))
        .unwrap();
        conn
    }

    fn status_of(conn: &Connection, id: i64) -> String {
        conn.query_row("SELECT status FROM build_target WHERE id = ?", [id], |r| {
            r.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_phase_a_uses_git_ref_to_pick_new_status() {
        let conn = dest_with(
            "INSERT INTO build (id, package_id, submitted_on, git_ref, status)
                 VALUES (1, 1, 100, 'abc123', 'succeeded'),
                        (2, 1, 200, NULL, 'succeeded');
             INSERT INTO build_target (id, build_id, target, status)
                 VALUES (1, 1, 'linux-x86_64', 'succeeded'),
                        (2, 2, 'linux-aarch64', 'succeeded');",
        );
        let touched = ensure_rebuild(&conn).unwrap();
        assert_eq!(touched, 2);
        assert_eq!(status_of(&conn, 1), "pending");
        assert_eq!(status_of(&conn, 2), "importing");
    }

    #[test]
    fn test_phase_a_leaves_non_succeeded_targets_alone() {
        let conn = dest_with(
            "INSERT INTO build (id, package_id, submitted_on, git_ref, status)
                 VALUES (1, 1, 100, 'abc123', 'succeeded');
             INSERT INTO build_target (id, build_id, target, status)
                 VALUES (1, 1, 'a', 'pending'),
                        (2, 1, 'b', 'failed'),
                        (3, 1, 'c', 'importing');",
        );
        let touched = ensure_rebuild(&conn).unwrap();
        assert_eq!(touched, 0);
        assert_eq!(status_of(&conn, 1), "pending");
        assert_eq!(status_of(&conn, 2), "failed");
        assert_eq!(status_of(&conn, 3), "importing");
    }

    #[test]
    fn test_phase_b_flips_failed_to_pending() {
        let conn = dest_with(
            "INSERT INTO build_target (id, build_id, target, status)
                 VALUES (1, 1, 'a', 'failed'),
                        (2, 1, 'b', 'pending'),
                        (3, 1, 'c', 'importing');",
        );
        let outcome = retry_failed(&conn).unwrap();
        assert_eq!(outcome.transitioned, 1);
        assert!(outcome.exhausted.is_empty());
        assert_eq!(status_of(&conn, 1), "pending");
        assert_eq!(status_of(&conn, 3), "importing");
    }

    #[test]
    fn test_phase_b_reports_exhaustion_after_fixed_sweeps() {
        // A trigger pushes the row straight back to failed, standing in for
        // the pathological case of a row that never leaves failed.
        let conn = dest_with(
            "INSERT INTO build_target (id, build_id, target, status)
                 VALUES (1, 7, 'stuck', 'failed');
             CREATE TRIGGER relapse AFTER UPDATE ON build_target
             WHEN NEW.status = 'pending'
             BEGIN
                 UPDATE build_target SET status = 'failed' WHERE id = NEW.id;
             END;",
        );
        let outcome = retry_failed(&conn).unwrap();
        assert_eq!(outcome.transitioned, RETRY_SWEEPS);
        assert_eq!(outcome.exhausted.len(), 1);
        assert_eq!(outcome.exhausted[0].id, 1);
        assert_eq!(outcome.exhausted[0].build_id, 7);
        assert_eq!(outcome.exhausted[0].target, "stuck");
    }
}
