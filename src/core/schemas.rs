//! Schema definitions for the build-tracking databases.
//!
//! Source and destination share the same five tables; only the destination
//! `package` table carries the `prior_status` snapshot column, which is
//! computed during the copy stage and has no source counterpart.

pub const OWNER_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS owner (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        mail TEXT,
        is_group INTEGER NOT NULL DEFAULT 0
    )
";

pub const PROJECT_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS project (
        id INTEGER PRIMARY KEY,
        owner_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        build_targets TEXT,
        permissions TEXT,
        auto_createrepo INTEGER NOT NULL DEFAULT 1,
        build_count INTEGER NOT NULL DEFAULT 0,
        deleted INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(owner_id) REFERENCES owner(id)
    )
";

pub const SOURCE_PACKAGE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS package (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        FOREIGN KEY(project_id) REFERENCES project(id)
    )
";

pub const DEST_PACKAGE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS package (
        id INTEGER PRIMARY KEY,
        project_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        prior_status TEXT,
        FOREIGN KEY(project_id) REFERENCES project(id)
    )
";

pub const BUILD_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS build (
        id INTEGER PRIMARY KEY,
        package_id INTEGER NOT NULL,
        submitted_on INTEGER NOT NULL,
        git_ref TEXT,
        status TEXT NOT NULL,
        FOREIGN KEY(package_id) REFERENCES package(id)
    )
";

pub const BUILD_TARGET_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS build_target (
        id INTEGER PRIMARY KEY,
        build_id INTEGER NOT NULL,
        target TEXT NOT NULL,
        status TEXT NOT NULL,
        FOREIGN KEY(build_id) REFERENCES build(id)
    )
";

/// All table DDL for a source-shaped database, dependency order.
pub const SOURCE_TABLES: [&str; 5] = [
    OWNER_SCHEMA,
    PROJECT_SCHEMA,
    SOURCE_PACKAGE_SCHEMA,
    BUILD_SCHEMA,
    BUILD_TARGET_SCHEMA,
];

/// All table DDL for a destination-shaped database, dependency order.
pub const DEST_TABLES: [&str; 5] = [
    OWNER_SCHEMA,
    PROJECT_SCHEMA,
    DEST_PACKAGE_SCHEMA,
    BUILD_SCHEMA,
    BUILD_TARGET_SCHEMA,
];
