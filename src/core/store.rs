//! Record store adapter: typed access to the source and destination
//! databases, with the stage-boundary transaction discipline.
//!
//! The source store is read-only for the whole migration, with one
//! exception: the targeted rebind step runs a short write transaction
//! through [`SourceStore::with_rebind_tx`]. The destination store takes all
//! other writes, one transaction per stage, committed only when the stage
//! completed in full.
//!
//! The insert helpers are grouped by the per-kind id policy declared in
//! [`crate::core::model::EntityKind::id_policy`]: preserved kinds bind the
//! source identifier explicitly, regenerated kinds leave the id column to
//! the destination and return the assigned value.

use crate::core::config::StoreConfig;
use crate::core::db;
use crate::core::error::MigrateError;
use crate::core::model::{
    Build, BuildStatus, BuildTarget, EntityKind, Owner, Package, Project, CLEAN_ORDER,
};
use crate::core::schemas;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

pub struct SourceStore {
    conn: Connection,
}

pub struct DestStore {
    conn: Connection,
}

fn map_owner(row: &Row) -> rusqlite::Result<Owner> {
    Ok(Owner {
        id: row.get(0)?,
        name: row.get(1)?,
        mail: row.get(2)?,
        is_group: row.get(3)?,
    })
}

fn map_project(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        build_targets: row.get(3)?,
        permissions: row.get(4)?,
        auto_createrepo: row.get(5)?,
        build_count: row.get(6)?,
        deleted: row.get(7)?,
    })
}

fn map_package(row: &Row) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn map_status(raw: String) -> rusqlite::Result<BuildStatus> {
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::other(e)),
        )
    })
}

fn map_build(row: &Row) -> rusqlite::Result<Build> {
    Ok(Build {
        id: row.get(0)?,
        package_id: row.get(1)?,
        submitted_on: row.get(2)?,
        git_ref: row.get(3)?,
        status: map_status(row.get(4)?)?,
    })
}

fn map_target(row: &Row) -> rusqlite::Result<BuildTarget> {
    Ok(BuildTarget {
        id: row.get(0)?,
        build_id: row.get(1)?,
        target: row.get(2)?,
        status: map_status(row.get(3)?)?,
    })
}

impl SourceStore {
    pub fn open(config: &StoreConfig) -> Result<Self, MigrateError> {
        Ok(SourceStore {
            conn: db::db_connect("source", config)?,
        })
    }

    pub fn owners(&self) -> Result<Vec<Owner>, MigrateError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, mail, is_group FROM owner ORDER BY id")?;
        let rows = stmt.query_map([], map_owner)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// All projects that were not soft-deleted in the source system.
    /// Deleted projects are dead weight and never migrated.
    pub fn live_projects(&self) -> Result<Vec<Project>, MigrateError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, owner_id, name, build_targets, permissions, auto_createrepo,
                    build_count, deleted
             FROM project WHERE deleted = 0 ORDER BY id",
        )?;
        let rows = stmt.query_map([], map_project)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    pub fn packages(&self, project_id: i64) -> Result<Vec<Package>, MigrateError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, project_id, name FROM package WHERE project_id = ? ORDER BY id")?;
        let rows = stmt.query_map([project_id], map_package)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// Most recent build of a package, optionally restricted to successful
    /// ones. This is the query the package-management layer exposes; the
    /// copier builds its best-build selection on top of it.
    pub fn last_build(
        &self,
        package_id: i64,
        successful_only: bool,
    ) -> Result<Option<Build>, MigrateError> {
        let sql = if successful_only {
            "SELECT id, package_id, submitted_on, git_ref, status FROM build
             WHERE package_id = ? AND status = 'succeeded'
             ORDER BY submitted_on DESC, id DESC LIMIT 1"
        } else {
            "SELECT id, package_id, submitted_on, git_ref, status FROM build
             WHERE package_id = ?
             ORDER BY submitted_on DESC, id DESC LIMIT 1"
        };
        Ok(self
            .conn
            .query_row(sql, [package_id], map_build)
            .optional()?)
    }

    pub fn targets(&self, build_id: i64) -> Result<Vec<BuildTarget>, MigrateError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, build_id, target, status FROM build_target WHERE build_id = ? ORDER BY id",
        )?;
        let rows = stmt.query_map([build_id], map_target)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    /// The one write capability the source store exposes, reserved for the
    /// rebind executor. Returns the number of affected rows.
    pub fn execute_raw<P: rusqlite::Params>(
        conn: &Connection,
        sql: &str,
        args: P,
    ) -> Result<usize, MigrateError> {
        Ok(conn.execute(sql, args)?)
    }

    /// Run `f` inside a short write transaction against the source store.
    /// Commits only if `f` succeeds.
    pub fn with_rebind_tx<F, R>(&mut self, f: F) -> Result<R, MigrateError>
    where
        F: FnOnce(&Transaction) -> Result<R, MigrateError>,
    {
        let tx = self.conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

impl DestStore {
    pub fn open(config: &StoreConfig) -> Result<Self, MigrateError> {
        Ok(DestStore {
            conn: db::db_connect("destination", config)?,
        })
    }

    /// Create any missing tables. The destination is normally provisioned
    /// ahead of time; this is a no-op then.
    pub fn init_schema(&self) -> Result<(), MigrateError> {
        for ddl in schemas::DEST_TABLES {
            self.conn.execute(ddl, [])?;
        }
        Ok(())
    }

    /// Run one stage inside a transaction. A failing stage leaves the
    /// destination untouched and re-runnable.
    pub fn with_stage_tx<F, R>(&mut self, f: F) -> Result<R, MigrateError>
    where
        F: FnOnce(&Transaction) -> Result<R, MigrateError>,
    {
        let tx = self.conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub fn count(&self, kind: EntityKind) -> Result<i64, MigrateError> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }
}

/// Delete every owned row, children before parents, so no foreign key
/// constraint fires regardless of how full the destination is.
pub fn clean(conn: &Connection) -> Result<(), MigrateError> {
    for kind in CLEAN_ORDER {
        let sql = format!("DELETE FROM {}", kind.table());
        conn.execute(&sql, [])?;
    }
    Ok(())
}

pub fn insert_owner(conn: &Connection, owner: &Owner) -> Result<(), MigrateError> {
    conn.execute(
        "INSERT INTO owner (id, name, mail, is_group) VALUES (?1, ?2, ?3, ?4)",
        params![owner.id, owner.name, owner.mail, owner.is_group],
    )
    .map_err(|e| MigrateError::from_write("owner", format!("id={}", owner.id), e))?;
    Ok(())
}

pub fn insert_project(conn: &Connection, project: &Project) -> Result<(), MigrateError> {
    conn.execute(
        "INSERT INTO project (id, owner_id, name, build_targets, permissions,
                              auto_createrepo, build_count, deleted)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            project.id,
            project.owner_id,
            project.name,
            project.build_targets,
            project.permissions,
            project.auto_createrepo,
            project.build_count,
            project.deleted,
        ],
    )
    .map_err(|e| {
        MigrateError::from_write(
            "project",
            format!("id={} owner_id={}", project.id, project.owner_id),
            e,
        )
    })?;
    Ok(())
}

pub fn insert_package(
    conn: &Connection,
    package: &Package,
    prior_status: BuildStatus,
) -> Result<(), MigrateError> {
    conn.execute(
        "INSERT INTO package (id, project_id, name, prior_status) VALUES (?1, ?2, ?3, ?4)",
        params![
            package.id,
            package.project_id,
            package.name,
            prior_status.as_str(),
        ],
    )
    .map_err(|e| {
        MigrateError::from_write(
            "package",
            format!("id={} project_id={}", package.id, package.project_id),
            e,
        )
    })?;
    Ok(())
}

/// Insert a build with a destination-assigned identifier and return it.
pub fn insert_build(conn: &Connection, build: &Build) -> Result<i64, MigrateError> {
    conn.execute(
        "INSERT INTO build (package_id, submitted_on, git_ref, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            build.package_id,
            build.submitted_on,
            build.git_ref,
            build.status.as_str(),
        ],
    )
    .map_err(|e| {
        MigrateError::from_write(
            "build",
            format!("source id={} package_id={}", build.id, build.package_id),
            e,
        )
    })?;
    Ok(conn.last_insert_rowid())
}

/// Insert a build target under `build_id` (a destination identifier) with a
/// fresh identifier of its own, returned.
pub fn insert_target(
    conn: &Connection,
    target: &BuildTarget,
    build_id: i64,
) -> Result<i64, MigrateError> {
    conn.execute(
        "INSERT INTO build_target (build_id, target, status) VALUES (?1, ?2, ?3)",
        params![build_id, target.target, target.status.as_str()],
    )
    .map_err(|e| {
        MigrateError::from_write(
            "build_target",
            format!("source id={} build_id={build_id}", target.id),
            e,
        )
    })?;
    Ok(conn.last_insert_rowid())
}
