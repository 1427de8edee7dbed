//! Typed records for the five entity kinds the migration owns, plus the
//! declarative per-kind copy policy.
//!
//! Owners, projects and packages keep their identifiers across the copy so
//! external references stay valid. Builds and build targets are dependent
//! history rows: they get fresh destination identifiers and are remapped to
//! their copied parents. That split is policy, not per-call judgement, so it
//! lives in one table here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Overall status of a build or of one of its per-target rows. `Unbuilt` is
/// the package-level sentinel for "never had a build" and never appears on a
/// build or target row.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Succeeded,
    Failed,
    Pending,
    Importing,
    Unbuilt,
}

impl BuildStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BuildStatus::Succeeded => "succeeded",
            BuildStatus::Failed => "failed",
            BuildStatus::Pending => "pending",
            BuildStatus::Importing => "importing",
            BuildStatus::Unbuilt => "unbuilt",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "succeeded" => Ok(BuildStatus::Succeeded),
            "failed" => Ok(BuildStatus::Failed),
            "pending" => Ok(BuildStatus::Pending),
            "importing" => Ok(BuildStatus::Importing),
            "unbuilt" => Ok(BuildStatus::Unbuilt),
            other => Err(format!("unknown build status: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Owner {
    pub id: i64,
    pub name: String,
    pub mail: Option<String>,
    pub is_group: bool,
}

#[derive(Debug, Clone)]
pub struct Project {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub build_targets: Option<String>,
    pub permissions: Option<String>,
    pub auto_createrepo: bool,
    pub build_count: i64,
    pub deleted: bool,
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Build {
    pub id: i64,
    pub package_id: i64,
    pub submitted_on: i64,
    pub git_ref: Option<String>,
    pub status: BuildStatus,
}

#[derive(Debug, Clone)]
pub struct BuildTarget {
    pub id: i64,
    pub build_id: i64,
    pub target: String,
    pub status: BuildStatus,
}

/// The entity kinds this tool owns in the destination store.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EntityKind {
    Owner,
    Project,
    Package,
    Build,
    BuildTarget,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Owner => "owner",
            EntityKind::Project => "project",
            EntityKind::Package => "package",
            EntityKind::Build => "build",
            EntityKind::BuildTarget => "build_target",
        }
    }

    pub fn id_policy(self) -> IdPolicy {
        match self {
            EntityKind::Owner | EntityKind::Project | EntityKind::Package => IdPolicy::Preserve,
            EntityKind::Build | EntityKind::BuildTarget => IdPolicy::Regenerate,
        }
    }
}

/// What happens to a row's identifier when it crosses stores.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IdPolicy {
    /// Keep the source identifier; the row is externally addressable.
    Preserve,
    /// Let the destination assign a fresh identifier and remap children.
    Regenerate,
}

/// Reverse dependency order for deletes: children before parents, so stage 0
/// never trips a foreign key constraint.
pub const CLEAN_ORDER: [EntityKind; 5] = [
    EntityKind::BuildTarget,
    EntityKind::Build,
    EntityKind::Package,
    EntityKind::Project,
    EntityKind::Owner,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in [
            BuildStatus::Succeeded,
            BuildStatus::Failed,
            BuildStatus::Pending,
            BuildStatus::Importing,
            BuildStatus::Unbuilt,
        ] {
            assert_eq!(s.as_str().parse::<BuildStatus>().unwrap(), s);
        }
        assert!("running".parse::<BuildStatus>().is_err());
    }

    #[test]
    fn test_id_policy_split() {
        assert_eq!(EntityKind::Owner.id_policy(), IdPolicy::Preserve);
        assert_eq!(EntityKind::Project.id_policy(), IdPolicy::Preserve);
        assert_eq!(EntityKind::Package.id_policy(), IdPolicy::Preserve);
        assert_eq!(EntityKind::Build.id_policy(), IdPolicy::Regenerate);
        assert_eq!(EntityKind::BuildTarget.id_policy(), IdPolicy::Regenerate);
    }

    #[test]
    fn test_clean_order_visits_children_first() {
        let pos = |k: EntityKind| CLEAN_ORDER.iter().position(|c| *c == k).unwrap();
        assert!(pos(EntityKind::BuildTarget) < pos(EntityKind::Build));
        assert!(pos(EntityKind::Build) < pos(EntityKind::Package));
        assert!(pos(EntityKind::Package) < pos(EntityKind::Project));
        assert!(pos(EntityKind::Project) < pos(EntityKind::Owner));
    }
}
