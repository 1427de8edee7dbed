//! Targeted repair of duplicate package bindings.
//!
//! A historical race in the submission path could create two package rows
//! with the same name under one project, leaving builds split across both.
//! The fix list below was curated from an offline audit: each entry repoints
//! every build from the duplicate package id to the canonical one. The
//! duplicate row itself is left in place; only the foreign keys move. There
//! is no inverse operation.

use crate::core::error::MigrateError;
use crate::core::store::SourceStore;
use rusqlite::Transaction;

/// One reviewed fix: rebind builds from `duplicate_id` to `canonical_id`.
/// `note` records which owner/project/package the audit traced the pair to.
#[derive(Debug, Clone, Copy)]
pub struct RebindFix {
    pub duplicate_id: i64,
    pub canonical_id: i64,
    pub note: &'static str,
}

/// The audited duplicate pairs. Append new entries here; the executor needs
/// no change.
pub const REBIND_FIXES: &[RebindFix] = &[
    RebindFix {
        duplicate_id: 188514,
        canonical_id: 188513,
        note: "nathans / pcp.io / parfaits",
    },
    RebindFix {
        duplicate_id: 188412,
        canonical_id: 188411,
        note: "abutcher / ansible / python-passlib",
    },
    RebindFix {
        duplicate_id: 186390,
        canonical_id: 186389,
        note: "decathorpe / elementary-nightly / elementary-dpms-helper",
    },
    RebindFix {
        duplicate_id: 188702,
        canonical_id: 188701,
        note: "@abrt / retrace-server-devel / retrace-server",
    },
];

/// Apply every fix inside `tx`. A pair whose duplicate id matches no build
/// rows (already rebound, or never present) is a no-op, so re-running the
/// whole list is safe. Returns the number of builds moved.
pub fn apply_fixes(tx: &Transaction, fixes: &[RebindFix]) -> Result<usize, MigrateError> {
    let mut moved = 0;
    for fix in fixes {
        let n = SourceStore::execute_raw(
            tx,
            "UPDATE build SET package_id = ?1 WHERE package_id = ?2",
            rusqlite::params![fix.canonical_id, fix.duplicate_id],
        )
        .map_err(|e| match e {
            MigrateError::Rusqlite(err) => MigrateError::from_write(
                "build",
                format!(
                    "rebind {} -> {} ({})",
                    fix.duplicate_id, fix.canonical_id, fix.note
                ),
                err,
            ),
            other => other,
        })?;
        moved += n;
    }
    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn seed() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE build (id INTEGER PRIMARY KEY, package_id INTEGER NOT NULL);
             INSERT INTO build (id, package_id) VALUES (1, 10), (2, 11), (3, 11), (4, 20);",
        )
        .unwrap();
        conn
    }

    fn package_ids(conn: &Connection) -> Vec<i64> {
        let mut stmt = conn
            .prepare("SELECT package_id FROM build ORDER BY id")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    const FIXES: &[RebindFix] = &[RebindFix {
        duplicate_id: 11,
        canonical_id: 10,
        note: "test pair",
    }];

    #[test]
    fn test_rebind_moves_children() {
        let mut conn = seed();
        let tx = conn.transaction().unwrap();
        let moved = apply_fixes(&tx, FIXES).unwrap();
        tx.commit().unwrap();
        assert_eq!(moved, 2);
        assert_eq!(package_ids(&conn), vec![10, 10, 10, 20]);
    }

    #[test]
    fn test_rebind_is_idempotent() {
        let mut conn = seed();
        for expected_moved in [2, 0] {
            let tx = conn.transaction().unwrap();
            let moved = apply_fixes(&tx, FIXES).unwrap();
            tx.commit().unwrap();
            assert_eq!(moved, expected_moved);
        }
        assert_eq!(package_ids(&conn), vec![10, 10, 10, 20]);
    }

    #[test]
    fn test_unknown_duplicate_is_a_noop() {
        let mut conn = seed();
        let tx = conn.transaction().unwrap();
        let moved = apply_fixes(
            &tx,
            &[RebindFix {
                duplicate_id: 999,
                canonical_id: 10,
                note: "never existed",
            }],
        )
        .unwrap();
        tx.commit().unwrap();
        assert_eq!(moved, 0);
        assert_eq!(package_ids(&conn), vec![10, 11, 11, 20]);
    }
}
