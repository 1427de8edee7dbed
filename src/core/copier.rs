//! Cross-store copy of the ownership graph.
//!
//! Owners, projects and packages move verbatim with their identifiers
//! intact. Build history is deliberately narrowed: per package only the best
//! build survives the migration, with fresh identifiers for it and its
//! per-target rows. Everything is staged into the destination transaction
//! owned by the copy stage; nothing is committed here.

use crate::core::error::MigrateError;
use crate::core::model::{Build, BuildStatus, Package};
use crate::core::store::{self, SourceStore};
use rusqlite::Transaction;

#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct CopyStats {
    pub owners: usize,
    pub projects: usize,
    pub packages: usize,
    pub builds: usize,
    pub targets: usize,
}

/// Best build of a package: the most recent succeeded one, else the most
/// recent of any status, else nothing.
fn best_build(src: &SourceStore, package_id: i64) -> Result<Option<Build>, MigrateError> {
    if let Some(build) = src.last_build(package_id, true)? {
        return Ok(Some(build));
    }
    src.last_build(package_id, false)
}

/// Copy one package and, when it has history, its best build with all
/// per-target rows. The copied package snapshots the chosen build's status
/// as `prior_status`; a package with no builds gets the `unbuilt` sentinel
/// and contributes no build rows at all.
fn copy_package(
    src: &SourceStore,
    tx: &Transaction,
    package: &Package,
    stats: &mut CopyStats,
) -> Result<(), MigrateError> {
    let best = best_build(src, package.id)?;
    let prior_status = best.as_ref().map_or(BuildStatus::Unbuilt, |b| b.status);
    store::insert_package(tx, package, prior_status)?;
    stats.packages += 1;

    if let Some(build) = best {
        // The destination assigns the build id; the package id was preserved
        // above, so the parent link carries over unchanged.
        let new_build_id = store::insert_build(tx, &build)?;
        stats.builds += 1;
        for target in src.targets(build.id)? {
            store::insert_target(tx, &target, new_build_id)?;
            stats.targets += 1;
        }
    }
    Ok(())
}

/// Copy the whole graph: every owner, every live project with its packages,
/// and per package the narrowed build history.
pub fn copy_all(src: &SourceStore, tx: &Transaction) -> Result<CopyStats, MigrateError> {
    let mut stats = CopyStats::default();

    for owner in src.owners()? {
        store::insert_owner(tx, &owner)?;
        stats.owners += 1;
    }
    for project in src.live_projects()? {
        store::insert_project(tx, &project)?;
        stats.projects += 1;
        for package in src.packages(project.id)? {
            copy_package(src, tx, &package, &mut stats)?;
        }
    }
    Ok(stats)
}
